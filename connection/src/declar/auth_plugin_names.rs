pub const MYSQL_NATIVE_PASSWORD: &str = "mysql_native_password";
pub const CACHING_SHA2_PASSWORD: &str = "caching_sha2_password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPlugin {
    MySqlNativePassword,
    CachingSha2Password,
}
