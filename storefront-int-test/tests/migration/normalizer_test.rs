use storefront::collection::{CollectionName, FindOptions};
use storefront::filter::Query;
use storefront::migration::{normalize_collection, normalize_collections, NormalizeReport};
use storefront_int_test::test_util::{cleanup, create_test_context, ids, run_test};

#[test]
fn test_second_run_is_noop() {
    run_test(
        create_test_context,
        |ctx| {
            let context = ctx.context();
            let store = context.document_store();
            let reviews = ctx.document_source(CollectionName::Reviews);
            let before = reviews.find(&Query::all(), &FindOptions::new())?;

            let first = normalize_collection(store, CollectionName::Reviews)?;
            assert_eq!(
                first,
                NormalizeReport {
                    collection: CollectionName::Reviews,
                    containers_removed: 1,
                    items_inserted: 2,
                }
            );
            let after_first = reviews.find(&Query::all(), &FindOptions::new())?;
            assert_eq!(after_first, before);
            assert!(store
                .collection(CollectionName::Reviews)
                .records()?
                .iter()
                .all(|record| !record.is_container()));

            let second = normalize_collection(store, CollectionName::Reviews)?;
            assert!(second.is_noop());
            assert_eq!(reviews.find(&Query::all(), &FindOptions::new())?, after_first);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_normalized_items_are_plain_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let context = ctx.context();
            normalize_collection(context.document_store(), CollectionName::Reviews)?;

            let reopened = ctx.reopen(storefront::DataMode::DocumentStore);
            let records = reopened
                .document_store()
                .collection(CollectionName::Reviews)
                .records()?;
            assert_eq!(records.len(), 3);
            let reviews = reopened.data_source(CollectionName::Reviews);
            assert_eq!(reviews.count(&Query::new().eq("customer_id", "cust_002"))?, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_all_collections_in_one_pass() {
    run_test(
        create_test_context,
        |ctx| {
            let context = ctx.context();
            let summary = normalize_collections(context.document_store(), &CollectionName::ALL);
            assert!(summary.is_success());
            let changed: Vec<CollectionName> = summary
                .reports
                .iter()
                .filter(|report| !report.is_noop())
                .map(|report| report.collection)
                .collect();
            assert_eq!(changed, vec![CollectionName::Reviews]);

            let all = ctx
                .document_source(CollectionName::Reviews)
                .find(&Query::all(), &FindOptions::new())?;
            assert_eq!(ids(&all), vec!["revi_001", "revi_002", "revi_003"]);
            Ok(())
        },
        cleanup,
    )
}
