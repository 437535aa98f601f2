use serde::Deserialize;
use storefront::collection::CollectionName;
use storefront::common::SortOrder;
use storefront::doc;
use storefront::service::ListOptions;
use storefront::DataMode;
use storefront_int_test::test_util::{cleanup, create_test_context, ids, run_test};

#[derive(Debug, Deserialize, PartialEq)]
struct Product {
    id: String,
    name: String,
    category: String,
    price: f64,
}

#[test]
fn test_customer_keeps_given_id() {
    run_test(
        create_test_context,
        |ctx| {
            let services = ctx.context().services();
            let created = services.customers.create(doc!{
                "id": "cust_010",
                "email": "margaret@example.com",
                "name": "Margaret"
            })?;
            assert_eq!(created.id(), Some("cust_010"));
            assert!(created.created_at().is_some());
            assert_eq!(created.created_at(), created.updated_at());

            let fetched = services.customers.get_by_id("cust_010")?;
            assert_eq!(fetched, Some(created));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_generated_ids_and_lifecycle() {
    run_test(
        create_test_context,
        |ctx| {
            let tickets = ctx.context().service(CollectionName::SupportTickets);
            let created = tickets.create(doc!{ "subject": "Late parcel", "status": "open" })?;
            let id = created.id().map(str::to_string).unwrap_or_default();
            assert!(id.starts_with("supp_"));

            let updated = tickets.update(&id, doc!{ "status": "closed", "created_at": "ignored" })?;
            let updated = updated.unwrap();
            assert_eq!(updated.get_str("status"), Some("closed"));
            assert_eq!(updated.created_at(), created.created_at());

            assert!(tickets.delete(&id)?);
            assert!(tickets.get_by_id(&id)?.is_none());
            assert!(tickets.update(&id, doc!{ "status": "open" })?.is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_listing_from_params() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.context().services().products;
            let options = ListOptions::from_params(&doc!{
                "category": "Books",
                "sort_by": "price",
                "sort_order": "desc",
                "page": "1",
                "limit": "1"
            })?;
            let page = products.get_all(&options)?;
            assert_eq!(ids(&page.items), vec!["prod_002"]);
            assert_eq!(page.total, 2);
            assert_eq!(page.total_pages(), 2);
            assert!(page.has_next());

            let last = products.get_all(&options.clone().page(2))?;
            assert_eq!(ids(&last.items), vec!["prod_001"]);
            assert!(!last.has_next());

            let beyond = products.get_all(&options.page(5))?;
            assert!(beyond.items.is_empty());
            assert_eq!(beyond.total, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_default_listing_is_newest_first() {
    run_test(
        create_test_context,
        |ctx| {
            let products = ctx.context().services().products;
            let page = products.get_all(&ListOptions::default())?;
            assert_eq!(ids(&page.items), vec!["prod_004", "prod_002", "prod_003", "prod_001"]);

            let oldest = products.get_all(&ListOptions::new().sort("created_at", SortOrder::Ascending).limit(1))?;
            assert_eq!(ids(&oldest.items), vec!["prod_001"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_reads_identical_in_both_modes() {
    run_test(
        create_test_context,
        |ctx| {
            let context = ctx.context();
            let products = context.services().products;
            let options = ListOptions::new().filter("category", "Books").sort("price", SortOrder::Ascending);

            let stored = products.get_all(&options)?;
            let typed: Option<Product> = products.get_by_id_as("prod_001")?;

            context.set_mode(DataMode::Snapshot);
            assert_eq!(products.get_all(&options)?, stored);
            assert_eq!(products.get_by_id_as::<Product>("prod_001")?, typed);
            assert_eq!(
                typed,
                Some(Product {
                    id: "prod_001".to_string(),
                    name: "Rust in Action".to_string(),
                    category: "Books".to_string(),
                    price: 9.99,
                })
            );
            assert_eq!(products.find_by("category", "Toys")?.len(), 1);
            Ok(())
        },
        cleanup,
    )
}
