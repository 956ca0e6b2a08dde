mod local_state;

pub use local_state::Storage;
