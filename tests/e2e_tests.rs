//! End-to-end integration tests
//!
//! These tests validate the complete replay pipeline using predefined CSV
//! fixtures. Each fixture directory under tests/fixtures/ holds:
//! 1. fleet.csv - the vehicles and their rates
//! 2. journal.csv - start and return events to replay
//! 3. expected.csv - the rental ledger after replay
//!
//! Fixtures cover:
//! - Happy path rentals returned on time
//! - Itemised charges (extra mileage, late fees, damage, credits)
//! - Events rejected by the lifecycle rules
//! - Malformed journal rows
//! - Vehicles rented again after a return
//! - Rental ids reused across vehicles
//!
//! Each test is run twice: once with the synchronous strategy and once with
//! the async strategy.

#[cfg(test)]
mod tests {
    use rental_billing_engine::cli::StrategyType;
    use rental_billing_engine::core::EngineConfig;
    use rental_billing_engine::io::{
        CsvOutbox, InMemoryLinkShortener, LinkShortener, TextDocumentRenderer,
    };
    use rental_billing_engine::strategy::{create_strategy, ReplaySession};
    use rstest::rstest;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Replay a fixture journal and compare the ledger with expected.csv
    fn run_test_fixture(fixture_name: &str, strategy_type: StrategyType) {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let fleet_path = format!("{}/fleet.csv", fixture_dir);
        let journal_path = format!("{}/journal.csv", fixture_dir);
        let expected_path = format!("{}/expected.csv", fixture_dir);

        for path in [&fleet_path, &journal_path, &expected_path] {
            assert!(Path::new(path).exists(), "Fixture file not found: {}", path);
        }

        let session = ReplaySession::from_fleet(Path::new(&fleet_path), EngineConfig::default())
            .unwrap_or_else(|e| panic!("Failed to load fleet: {}", e));
        let strategy = create_strategy(strategy_type.clone(), None);

        strategy
            .process(&session, Path::new(&journal_path))
            .unwrap_or_else(|e| panic!("Failed to replay journal: {}", e));

        let mut output = Vec::new();
        session
            .write_ledger(&mut output)
            .unwrap_or_else(|e| panic!("Failed to write ledger: {}", e));
        let actual_output = String::from_utf8(output).expect("Ledger is not UTF-8");

        let expected_output = fs::read_to_string(&expected_path)
            .unwrap_or_else(|e| panic!("Failed to read expected file {}: {}", expected_path, e));

        assert_eq!(
            actual_output, expected_output,
            "\n\nOutput mismatch for fixture: {} (strategy: {:?})\n\nActual output:\n{}\n\nExpected output:\n{}\n",
            fixture_name, strategy_type, actual_output, expected_output
        );
    }

    /// End-to-end test for all fixtures with both strategies
    #[rstest]
    #[case("happy_path")]
    #[case("itemised_charges")]
    #[case("rejected_events")]
    #[case("malformed_data")]
    #[case("vehicle_reuse")]
    #[case("empty_journal")]
    #[case("shared_rental_ids")]
    fn test_fixtures(
        #[case] fixture: &str,
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        run_test_fixture(fixture, strategy);
    }

    fn replay_ledger(fixture_name: &str, strategy_type: StrategyType) -> String {
        let fixture_dir = format!("tests/fixtures/{}", fixture_name);
        let session = ReplaySession::from_fleet(
            Path::new(&format!("{}/fleet.csv", fixture_dir)),
            EngineConfig::default(),
        )
        .unwrap();

        create_strategy(strategy_type, None)
            .process(&session, Path::new(&format!("{}/journal.csv", fixture_dir)))
            .unwrap();

        let mut output = Vec::new();
        session.write_ledger(&mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn test_async_replay_is_deterministic_for_shared_rental_ids() {
        let expected = replay_ledger("shared_rental_ids", StrategyType::Sync);

        for run in 0..50 {
            let actual = replay_ledger("shared_rental_ids", StrategyType::Async);
            assert_eq!(actual, expected, "Async ledger differs on run {}", run);
        }
    }

    #[rstest]
    fn test_replay_report_counts(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let session = ReplaySession::from_fleet(
            Path::new("tests/fixtures/malformed_data/fleet.csv"),
            EngineConfig::default(),
        )
        .unwrap();

        let report = create_strategy(strategy, None)
            .process(&session, Path::new("tests/fixtures/malformed_data/journal.csv"))
            .unwrap();

        assert_eq!(report.applied, 3);
        assert_eq!(report.rejected, 0);
        assert_eq!(report.skipped, 5);
        assert_eq!(report.warnings, 0);
    }

    #[rstest]
    fn test_fleet_state_after_replay(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let session = ReplaySession::from_fleet(
            Path::new("tests/fixtures/vehicle_reuse/fleet.csv"),
            EngineConfig::default(),
        )
        .unwrap();

        create_strategy(strategy, None)
            .process(&session, Path::new("tests/fixtures/vehicle_reuse/journal.csv"))
            .unwrap();

        let mut output = Vec::new();
        session.write_fleet(&mut output).unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "vehicle,status,mileage,rental\n\
             1,Available,1350,\n\
             2,Available,2300,\n\
             3,Rented,500,4\n"
        );
    }

    #[rstest]
    fn test_documents_and_outbox(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let dir = TempDir::new().unwrap();
        let documents_dir = dir.path().join("documents");
        let outbox_path = dir.path().join("outbox.csv");

        let renderer = TextDocumentRenderer::new(&documents_dir).unwrap();
        let outbox = CsvOutbox::new(fs::File::create(&outbox_path).unwrap(), "RIDEON").unwrap();
        let session = ReplaySession::from_fleet(
            Path::new("tests/fixtures/happy_path/fleet.csv"),
            EngineConfig::default(),
        )
        .unwrap()
        .with_documents(Arc::new(renderer))
        .with_notifier(Arc::new(outbox));

        let report = create_strategy(strategy, None)
            .process(&session, Path::new("tests/fixtures/happy_path/journal.csv"))
            .unwrap();

        assert_eq!(report.applied, 4);
        assert_eq!(report.warnings, 0);
        for name in ["agreement-1.txt", "agreement-2.txt", "invoice-1.txt", "invoice-2.txt"] {
            assert!(documents_dir.join(name).exists(), "Missing document {}", name);
        }
        let invoice = fs::read_to_string(documents_dir.join("invoice-1.txt")).unwrap();
        assert!(invoice.contains("Total due: 12000.00"));

        let outbox = fs::read_to_string(&outbox_path).unwrap();
        assert_eq!(outbox.lines().count(), 5);
        assert!(outbox.contains("94771234567,RIDEON,agreement,"));
        assert!(outbox.contains("94712345678,RIDEON,invoice,"));
    }

    #[rstest]
    fn test_outbox_sends_short_links(
        #[values(StrategyType::Sync, StrategyType::Async)] strategy: StrategyType,
    ) {
        let dir = TempDir::new().unwrap();
        let documents_dir = dir.path().join("documents");
        let outbox_path = dir.path().join("outbox.csv");

        let shortener = Arc::new(InMemoryLinkShortener::new("https://rideon.lk"));
        let outbox = CsvOutbox::new(fs::File::create(&outbox_path).unwrap(), "RIDEON")
            .unwrap()
            .with_shortener(shortener.clone());
        let session = ReplaySession::from_fleet(
            Path::new("tests/fixtures/happy_path/fleet.csv"),
            EngineConfig::default(),
        )
        .unwrap()
        .with_documents(Arc::new(TextDocumentRenderer::new(&documents_dir).unwrap()))
        .with_notifier(Arc::new(outbox));

        let report = create_strategy(strategy, None)
            .process(&session, Path::new("tests/fixtures/happy_path/journal.csv"))
            .unwrap();
        assert_eq!(report.warnings, 0);

        let links = shortener.links();
        assert_eq!(links.len(), 4);

        let outbox = fs::read_to_string(&outbox_path).unwrap();
        for (id, long_url) in &links {
            assert!(outbox.contains(&format!("https://rideon.lk/r/{}", id)));
            assert_eq!(shortener.resolve(id).as_ref(), Some(long_url));
            assert!(Path::new(long_url).exists(), "Short link target missing: {}", long_url);
        }
    }
}
