//! Entity services: the CRUD surface route handlers call.
//!
//! Every entity gets the same five operations, generated from its
//! [CollectionName](crate::collection::CollectionName) and working only
//! through the [DataSource](crate::source::DataSource) of the current mode.
//! [EntityServices] adds the few queries that span collections: active
//! promotions and products by category.
mod catalog;
mod entity_service;
mod list_options;

pub use entity_service::*;
pub use list_options::*;

use crate::collection::CollectionName;
use crate::data_context::DataContext;

/// One [EntityService] per entity collection.
#[derive(Clone)]
pub struct EntityServices {
    pub customers: EntityService,
    pub orders: EntityService,
    pub carts: EntityService,
    pub wishlists: EntityService,
    pub reviews: EntityService,
    pub support_tickets: EntityService,
    pub faq: EntityService,
    pub promotions: EntityService,
    pub returns: EntityService,
    pub notifications: EntityService,
    pub payments: EntityService,
    pub categories: EntityService,
    pub products: EntityService,
}

impl EntityServices {
    pub fn new(context: &DataContext) -> Self {
        let service = |name| EntityService::new(context.clone(), name);
        EntityServices {
            customers: service(CollectionName::Customers),
            orders: service(CollectionName::Orders),
            carts: service(CollectionName::Carts),
            wishlists: service(CollectionName::Wishlists),
            reviews: service(CollectionName::Reviews),
            support_tickets: service(CollectionName::SupportTickets),
            faq: service(CollectionName::Faq),
            promotions: service(CollectionName::Promotions),
            returns: service(CollectionName::Returns),
            notifications: service(CollectionName::Notifications),
            payments: service(CollectionName::Payments),
            categories: service(CollectionName::Categories),
            products: service(CollectionName::Products),
        }
    }
}
