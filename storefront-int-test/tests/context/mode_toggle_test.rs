use storefront::collection::{CollectionName, UpdateOptions, UpdateSpec};
use storefront::doc;
use storefront::errors::ErrorKind;
use storefront::filter::Query;
use storefront::store::InitOutcome;
use storefront::DataMode;
use storefront_int_test::test_util::{cleanup, create_snapshot_test_context, create_test_context, run_test};

#[test]
fn test_toggle_keeps_document_store_data() {
    run_test(
        create_test_context,
        |ctx| {
            let context = ctx.context();
            let customers = context.service(CollectionName::Customers);
            customers.create(doc!{ "id": "cust_010", "email": "joan@example.com" })?;

            let outcome = context.toggle_mode(false);
            assert_eq!(outcome.previous, DataMode::DocumentStore);
            assert_eq!(outcome.current, DataMode::Snapshot);
            assert!(customers.get_by_id("cust_010")?.is_none());
            let err = context
                .data_source(CollectionName::Customers)
                .update(&Query::by_id("cust_001"), &UpdateSpec::set(doc!{ "tier": "none" }), UpdateOptions::default())
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnsupportedOperation);

            let outcome = context.toggle_mode(false);
            assert_eq!(outcome.current, DataMode::DocumentStore);
            assert!(outcome.reseed.is_none());
            assert!(customers.get_by_id("cust_010")?.is_some());
            let ada = customers.get_by_id("cust_001")?;
            assert_eq!(ada.and_then(|d| d.get_str("tier").map(String::from)), Some("gold".to_string()));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_toggle_with_reseed_starts_over() {
    run_test(
        create_snapshot_test_context,
        |ctx| {
            let context = ctx.context();
            context.set_mode(DataMode::DocumentStore);
            context.service(CollectionName::Products).delete("prod_001")?;
            context.set_mode(DataMode::Snapshot);

            let outcome = context.toggle_mode(true);
            assert_eq!(outcome.current, DataMode::DocumentStore);
            let report = outcome.reseed.unwrap();
            assert!(report.is_success());
            assert!(report.initialized.contains(&(CollectionName::Products, InitOutcome::Seeded(4))));
            assert!(report.initialized.contains(&(CollectionName::Customers, InitOutcome::Seeded(2))));
            assert!(report.initialized.contains(&(CollectionName::Reviews, InitOutcome::Seeded(2))));
            assert_eq!(report.seeded_documents(), 4 + 2 + 2 + 1);

            let again = context.initialize_all_collections();
            assert_eq!(again.seeded_documents(), 0);
            assert!(again.initialized.contains(&(CollectionName::Products, InitOutcome::LoadedNonEmpty)));

            assert!(context.service(CollectionName::Products).get_by_id("prod_001")?.is_some());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_status_reports_files() {
    run_test(
        create_test_context,
        |ctx| {
            let context = ctx.context();
            let report = context.initialize_all_collections();
            assert!(report.is_success());
            assert_eq!(report.initialized.len(), 4);

            let status = context.status()?;
            assert_eq!(status.mode, DataMode::DocumentStore);
            assert_eq!(status.access, "read-write");
            let names: Vec<&str> = status.files.iter().map(|f| f.file_name.as_str()).collect();
            assert_eq!(names, vec!["products.db", "customers.db", "reviews.db", "faq.db"]);
            assert!(status.files.iter().all(|f| f.size > 0 && f.modified.is_some()));

            let json = serde_json::to_value(&status)?;
            assert_eq!(json["mode"], "document_store");

            context.toggle_mode(false);
            let status = context.status()?;
            assert_eq!(status.access, "read-only");
            assert!(status.db_path.is_none());
            assert!(status.files.is_empty());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_normalize_only_in_document_store_mode() {
    run_test(
        create_snapshot_test_context,
        |ctx| {
            let context = ctx.context();
            let err = context.normalize_all_collections().unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UnsupportedOperation);

            context.toggle_mode(false);
            let summary = context.normalize_all_collections()?;
            assert!(summary.is_success());
            Ok(())
        },
        cleanup,
    )
}
