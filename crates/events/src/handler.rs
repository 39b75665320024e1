/// Execute an aggregate command deterministically (no IO).
///
/// 1. **Decide**: `aggregate.handle(command)` produces events without mutating.
/// 2. **Evolve**: each event is applied in order.
///
/// If `handle` fails nothing is applied, so a rejected command leaves the
/// aggregate exactly as it was.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: gemledger_core::Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gemledger_core::{Aggregate, AggregateRoot, DomainError};

    #[derive(Debug, Clone)]
    struct Counter {
        id: u8,
        value: i64,
        version: u64,
    }

    impl AggregateRoot for Counter {
        type Id = u8;

        fn id(&self) -> &Self::Id {
            &self.id
        }

        fn version(&self) -> u64 {
            self.version
        }
    }

    impl Aggregate for Counter {
        type Command = i64;
        type Event = i64;
        type Error = DomainError;

        fn apply(&mut self, event: &Self::Event) {
            self.value += event;
            self.version += 1;
        }

        fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
            if self.value + command < 0 {
                return Err(DomainError::validation("cannot go negative"));
            }
            Ok(vec![*command])
        }
    }

    #[test]
    fn accepted_command_is_applied() {
        let mut c = Counter { id: 1, value: 5, version: 0 };
        let events = execute(&mut c, &-3).unwrap();
        assert_eq!(events, vec![-3]);
        assert_eq!(c.value, 2);
        assert_eq!(c.version(), 1);
    }

    #[test]
    fn rejected_command_leaves_state_untouched() {
        let mut c = Counter { id: 1, value: 5, version: 0 };
        assert!(execute(&mut c, &-6).is_err());
        assert_eq!(c.value, 5);
        assert_eq!(c.version(), 0);
    }
}
