pub mod books;
pub mod contact;

use std::sync::Arc;

use inkwell_kernel::ModuleRegistry;

use crate::store::RecordStore;
use crate::upload::UploadStore;

/// Register the application modules, sharing one record store between them
pub fn register_all(
    registry: &mut ModuleRegistry,
    store: Arc<dyn RecordStore>,
    uploads: UploadStore,
) {
    registry.register(books::create_module(store.clone(), uploads));
    registry.register(contact::create_module(store));
}
