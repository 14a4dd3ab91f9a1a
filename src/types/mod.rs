pub(crate) mod af;
pub(crate) mod prefix_id;
pub mod prefix_record;

pub(crate) use af::AddressFamily;
pub(crate) use prefix_id::PrefixId;
