use crate::commands::{scramble_native, scramble_sha256};
use crate::declar::auth_plugin_names::AuthPlugin;

/// Reply to an AuthSwitchRequest: just the freshly scrambled password.
#[derive(Debug)]
pub struct AuthPluginSwitchCommand<'a> {
    password: &'a str,
    auth_plugin_data: &'a [u8],
    auth_plugin: AuthPlugin,
}

impl<'a> AuthPluginSwitchCommand<'a> {
    pub fn new(password: &'a str, auth_plugin_data: &'a [u8], auth_plugin: AuthPlugin) -> Self {
        AuthPluginSwitchCommand {
            password,
            auth_plugin_data,
            auth_plugin,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self.auth_plugin {
            AuthPlugin::MySqlNativePassword => {
                scramble_native(self.password, self.auth_plugin_data)
            }
            AuthPlugin::CachingSha2Password => {
                scramble_sha256(self.password, self.auth_plugin_data)
            }
        }
    }
}
