//! Integration tests for the service pipeline.
//!
//! Tests: Settings → LotService / MatchingService → store + journal
//!
//! Verifies:
//! - Imported and received lots reconcile (or not) as their history says
//! - Concurrent sales never oversell a lot
//! - Matching runs over the shared diamond repository

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::{NaiveDate, Utc};

    use gemledger_core::{AggregateId, AggregateRoot, ExpectedVersion};
    use gemledger_lots::{
        Lot, LotFilter, LotId, LotRecord, LotStatus, LotTransaction, ReceiveLot, StatusFilter,
        TransactionKind,
    };
    use gemledger_stones::{
        ClarityGrade, ColorGrade, CutGrade, Diamond, DiamondId, Shape, ShapeFilter,
    };

    use crate::config::{ENV_CARAT_TOLERANCE, Settings};
    use crate::lot_service::{LotService, ServiceError};
    use crate::matching_service::MatchingService;
    use crate::store::InMemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tx(kind: TransactionKind, carats: f64, handler: &str, customer: Option<&str>) -> LotTransaction {
        let t = LotTransaction::new(kind, date(2025, 3, 1), carats, handler);
        match customer {
            Some(c) => t.with_customer(c),
            None => t,
        }
    }

    fn record(
        code: &str,
        total: f64,
        remaining: f64,
        source: &str,
        handler: &str,
        transactions: Vec<LotTransaction>,
    ) -> LotRecord {
        LotRecord {
            id: LotId::new(AggregateId::new()),
            code: code.to_string(),
            total_carats: total,
            remaining_carats: remaining,
            date_received: date(2025, 1, 15),
            source: source.to_string(),
            initial_value: 10_000_000,
            handler: handler.to_string(),
            notes: None,
            last_modified: Utc::now(),
            transactions,
        }
    }

    fn seeded() -> LotService<Arc<InMemoryStore<LotId, Lot>>> {
        let svc = LotService::new(Arc::new(InMemoryStore::new()));
        let lots = [
            record(
                "LOT-2025-001",
                500.0,
                250.0,
                "De Beers",
                "John Doe",
                vec![
                    tx(TransactionKind::Sale, 100.0, "John Doe", Some("Tiffany & Co")),
                    tx(TransactionKind::Sale, 200.0, "Emma Johnson", Some("Cartier")),
                    tx(TransactionKind::Return, 50.0, "John Doe", Some("Tiffany & Co")),
                ],
            ),
            record(
                "LOT-2025-002",
                300.0,
                200.0,
                "ALROSA",
                "Michael Chen",
                vec![
                    tx(TransactionKind::Sale, 75.0, "Michael Chen", Some("Blue Nile")),
                    tx(TransactionKind::Transfer, 25.0, "David Wilson", None),
                ],
            ),
            record(
                "LOT-2025-003",
                250.0,
                100.0,
                "Rio Tinto",
                "Emma Johnson",
                vec![tx(TransactionKind::Sale, 150.0, "Emma Johnson", Some("Harry Winston"))],
            ),
            record("LOT-2025-004", 600.0, 600.0, "Petra Diamonds", "David Wilson", vec![]),
        ];
        for lot in lots {
            svc.import(lot).unwrap();
        }
        svc
    }

    #[test]
    fn audit_flags_only_the_transfer_discrepancy() {
        let svc = seeded();
        let reports = svc.audit();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].code, "LOT-2025-002");
        assert_eq!(reports[0].expected, 225.0);
        assert_eq!(reports[0].recorded, 200.0);
        assert_eq!(reports[0].difference, -25.0);

        // Auditing never rewrites balances.
        let lot = svc
            .filter(
                &LotFilter {
                    search: Some("alrosa".to_string()),
                    ..LotFilter::default()
                },
                None,
            )
            .remove(0);
        assert_eq!(lot.remaining_carats(), 200.0);
    }

    #[test]
    fn summary_and_filters_over_seeded_lots() {
        let svc = seeded();

        let summary = svc.summary();
        assert_eq!(summary.total_lots, 4);
        assert_eq!(summary.total_carats, 1650.0);
        assert_eq!(summary.sold_carats, 525.0);
        assert_eq!(summary.returned_carats, 50.0);
        assert_eq!(summary.remaining_carats, 1150.0);

        let active = svc.filter(
            &LotFilter {
                status: StatusFilter::Active,
                ..LotFilter::default()
            },
            Some(2),
        );
        let codes: Vec<_> = active.iter().map(|l| l.code().to_string()).collect();
        assert_eq!(codes, vec!["LOT-2025-001", "LOT-2025-002"]);

        let wilson = svc.filter(
            &LotFilter {
                handler: Some("David Wilson".to_string()),
                ..LotFilter::default()
            },
            None,
        );
        assert_eq!(wilson.len(), 1);
        assert_eq!(wilson[0].status(), LotStatus::New);
    }

    #[test]
    fn imported_lot_accepts_new_transactions() {
        let svc = seeded();
        let lot = svc.list().into_iter().find(|l| l.code() == "LOT-2025-003").unwrap();
        let id = lot.id_typed();

        let err = svc
            .record_transaction(
                id,
                ExpectedVersion::Exact(0),
                tx(TransactionKind::Sale, 100.5, "Emma Johnson", Some("Cartier")),
            )
            .unwrap_err();
        assert!(err.is_rejection());

        let sold_out = svc
            .record_transaction(
                id,
                ExpectedVersion::Exact(0),
                tx(TransactionKind::Sale, 100.0, "Emma Johnson", Some("Cartier")),
            )
            .unwrap();
        assert_eq!(sold_out.status(), LotStatus::Completed);
        assert_eq!(sold_out.version(), 1);
        assert_eq!(svc.history(id).unwrap().len(), 1);
        assert!(svc.audit().iter().all(|r| r.lot_id != id));
    }

    #[test]
    fn concurrent_sales_never_oversell() {
        let svc = Arc::new(LotService::new(InMemoryStore::<LotId, Lot>::new()));
        let lot = svc
            .receive_lot(ReceiveLot {
                lot_id: LotId::new(AggregateId::new()),
                code: "LOT-2025-05-001".to_string(),
                total_carats: 10.0,
                date_received: date(2025, 5, 2),
                source: "De Beers".to_string(),
                initial_value: 500_000,
                handler: "John Doe".to_string(),
                notes: None,
                occurred_at: Utc::now(),
            })
            .unwrap();
        let id = lot.id_typed();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = svc.clone();
                thread::spawn(move || {
                    svc.record_transaction(
                        id,
                        ExpectedVersion::Any,
                        tx(TransactionKind::Sale, 2.0, "John Doe", Some("Blue Nile")),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let accepted = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(ServiceError::Domain(_))))
            .count();

        assert_eq!(accepted, 5);
        assert_eq!(rejected, 3);

        let lot = svc.get(id).unwrap();
        assert!(lot.remaining_carats().abs() < 1e-9);
        assert_eq!(lot.transactions().len(), 5);
        assert_eq!(svc.journal().version(id.0).unwrap(), 6);
        assert_eq!(svc.replay(id).unwrap(), lot);
        assert!(svc.audit().is_empty());
    }

    #[test]
    fn settings_drive_matching() {
        let settings = Settings::from_lookup(|key| {
            (key == ENV_CARAT_TOLERANCE).then(|| "1".to_string())
        })
        .unwrap();

        let store: Arc<InMemoryStore<DiamondId, Diamond>> = Arc::new(InMemoryStore::new());
        let svc = MatchingService::new(store.clone(), settings.default_criteria.clone()).unwrap();
        for (sku, carat) in [("RD-1", 1.00), ("RD-2", 1.02), ("RD-3", 1.005)] {
            svc.add_diamond(Diamond::new(
                sku,
                Shape::Round,
                carat,
                ColorGrade::F,
                ClarityGrade::VS1,
                CutGrade::Excellent,
                900_000,
            ))
            .unwrap();
        }

        // 1% tolerance: 1.00 and 1.005 pair up, 1.02 is left out.
        let sets = svc.find_default_matches().unwrap();
        assert_eq!(sets.len(), 1);
        let skus: Vec<_> = sets[0].diamonds.iter().map(|d| d.sku.as_str()).collect();
        assert_eq!(skus, vec!["RD-1", "RD-3"]);

        // The default 5% tolerance keeps all three together.
        let wide = svc
            .find_matches(&gemledger_stones::MatchingCriteria {
                shape: ShapeFilter::Only(Shape::Round),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(wide.len(), 1);
        assert_eq!(wide[0].len(), 3);
    }
}
