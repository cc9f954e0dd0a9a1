mod relinearization_key;

pub use relinearization_key::RelinearizationKey;
