pub mod dates;
pub mod db_utils;
pub mod error;
pub mod i18n;

#[cfg(test)]
pub(crate) mod test_support;
