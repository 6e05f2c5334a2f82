pub mod assemble;
pub mod mosaics;
pub mod photos;

pub use assemble::{__path_handle_assemble, __path_handle_dispatch, __path_handle_iterator};
pub use assemble::{handle_assemble, handle_dispatch, handle_iterator, DispatchResponse};
pub use mosaics::{__path_handle_create, __path_handle_get_mosaic};
pub use mosaics::{
    handle_create, handle_get_mosaic, CreateMosaicRequest, CreateMosaicResponse, MosaicMeta,
};
pub use photos::{handle_photos, PhotosRequest, __path_handle_photos};
