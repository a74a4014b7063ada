pub mod layout;
pub mod packer;
