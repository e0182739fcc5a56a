pub mod ext;
pub mod openrtb;
