use storefront::collection::{CollectionName, FindOptions, Projection, SortSpec};
use storefront::common::SortOrder;
use storefront::doc;
use storefront::filter::Query;
use storefront::source::DataSource;
use storefront_int_test::test_util::{cleanup, create_test_context, ids, run_test};

const COLLECTIONS: [CollectionName; 4] = [
    CollectionName::Products,
    CollectionName::Customers,
    CollectionName::Reviews,
    CollectionName::Faq,
];

#[test]
fn test_whole_collections_match() {
    run_test(
        create_test_context,
        |ctx| {
            for name in COLLECTIONS {
                let store = ctx.document_source(name);
                let snapshot = ctx.snapshot_source(name);
                let all = Query::all();

                let stored = store.find(&all, &FindOptions::new())?;
                let cached = snapshot.find(&all, &FindOptions::new())?;
                assert_eq!(stored, cached, "documents of {}", name);
                assert_eq!(store.count(&all)?, snapshot.count(&all)?, "count of {}", name);
                assert_eq!(store.count(&all)?, stored.len());
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_books_sorted_by_price() {
    run_test(
        create_test_context,
        |ctx| {
            let query = Query::from_document(&doc!{ "category": "Books" })?;
            let options = FindOptions::new()
                .with_sort(SortSpec::from_document(&doc!{ "price": 1 })?)
                .limit(2);

            let stored = ctx.document_source(CollectionName::Products).find(&query, &options)?;
            let cached = ctx.snapshot_source(CollectionName::Products).find(&query, &options)?;
            assert_eq!(ids(&stored), vec!["prod_001", "prod_002"]);
            assert_eq!(stored, cached);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_one_and_projection() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.document_source(CollectionName::Products);
            let snapshot = ctx.snapshot_source(CollectionName::Products);

            let query = Query::by_id("prod_003");
            assert_eq!(store.find_one(&query)?, snapshot.find_one(&query)?);
            assert!(store.find_one(&Query::by_id("prod_999"))?.is_none());
            assert!(snapshot.find_one(&Query::by_id("prod_999"))?.is_none());

            let options = FindOptions::new()
                .sort_by("created_at", SortOrder::Descending)
                .projection(Projection::new().include("id").include("price"));
            let stored = store.find(&Query::all(), &options)?;
            assert_eq!(stored, snapshot.find(&Query::all(), &options)?);
            assert_eq!(stored[0], doc!{ "id": "prod_004", "price": 7.25 });
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_nested_items_served_by_both() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.document_source(CollectionName::Reviews);
            let snapshot = ctx.snapshot_source(CollectionName::Reviews);

            let all = store.find(&Query::all(), &FindOptions::new())?;
            assert_eq!(ids(&all), vec!["revi_001", "revi_002", "revi_003"]);

            let by_id = Query::by_id("revi_002");
            let stored = store.find_one(&by_id)?;
            assert_eq!(stored.as_ref().and_then(|d| d.get_str("product_id")), Some("prod_002"));
            assert_eq!(stored, snapshot.find_one(&by_id)?);

            let by_customer = Query::new().eq("customer_id", "cust_002");
            assert_eq!(store.count(&by_customer)?, 2);
            assert_eq!(snapshot.count(&by_customer)?, 2);

            let options = FindOptions::new().sort_by("rating", SortOrder::Ascending);
            let stored = store.find(&Query::new().eq("product_id", "prod_001"), &options)?;
            assert_eq!(ids(&stored), vec!["revi_003", "revi_001"]);
            assert_eq!(stored, snapshot.find(&Query::new().eq("product_id", "prod_001"), &options)?);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_operators_only_in_document_store() {
    run_test(
        create_test_context,
        |ctx| {
            let query = Query::from_document(&doc!{ "price": { "$lt": 10 } })?;
            let stored = ctx.document_source(CollectionName::Products).find(&query, &FindOptions::new())?;
            assert_eq!(ids(&stored), vec!["prod_001", "prod_004"]);

            let snapshot = ctx.snapshot_source(CollectionName::Products);
            assert_eq!(snapshot.count(&query)?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_missing_fixture_is_empty_everywhere() {
    run_test(
        create_test_context,
        |ctx| {
            let store = ctx.document_source(CollectionName::Payments);
            let snapshot = ctx.snapshot_source(CollectionName::Payments);
            assert_eq!(store.count(&Query::all())?, 0);
            assert_eq!(snapshot.count(&Query::all())?, 0);
            assert!(snapshot.find(&Query::all(), &FindOptions::new())?.is_empty());
            Ok(())
        },
        cleanup,
    )
}
