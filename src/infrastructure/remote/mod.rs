pub mod firebase_rest;
pub mod in_memory;

pub use firebase_rest::FirebaseRestDataSource;
pub use in_memory::InMemoryProfileDataSource;
