pub mod database;
pub mod mock;
pub mod store;

pub use database::MongoStore;
pub use mock::MockStore;
pub use store::{DocumentStore, LookupKey, StoreError};
