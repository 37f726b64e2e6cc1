use base64::{engine::general_purpose, Engine as _};

/// Where the contract runtime is built to by `wasm-pack` in a sibling checkout.
pub const DEFAULT_RUNTIME_PATH: &str = "../rs-stellar-wasm-browser/pkg/stellar_wasm_browser_bg.wasm";

pub const DEFAULT_CONTRACT_ID: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

pub const DEFAULT_FUNCTION: &str = "pixel";

/// The pixel NFT contract, base64 encoded. `pixel()` returns the XDR for the
/// symbol of a single pixel.
pub const PIXEL_NFT_WASM: &str = "AGFzbQEAAAABDgNgAAF+YAF/AGABfwF+AwUEAAABAgUDAQARBhkDfwFBgIDAAAt/AEG8gcAAC38AQcCBwAALBzUFBm1lbW9yeQIABXBpeGVsAAAFb3duZXIAAQpfX2RhdGFfZW5kAwELX19oZWFwX2Jhc2UDAgqYAwQJAELxv+u+lQEL+QICA38CfgJ+IwBBEGsiACQAA0ACQAJAIAACfyACQQpGBEAgAEEIaiAEQgSGQgmENwMAQQAMAQsgAkEKRwRAQgEhAyACQYCAQGstAAAiAUHfAEYNAiABrSEDAkACQCABQTBrQf8BcUEKTwRAIAFBwQBrQf8BcUEaSQ0BIAFB4QBrQf8BcUEaSQ0CIABBATYCBCAAQQhqIAE2AgBBAQwECyADQi59IQMMBAsgA0I1fSEDDAMLIANCO30hAwwCCyAAQQA2AgQgAEEIakEKNgIAQQELNgIADAELIAJBAWohAiADIARCBoaEIQQMAQsLIAAoAgBFBEAgACkDCCAAQRBqJAAMAQsjAEEgayIAJAAgAEEUakEANgIAIABBrIHAADYCECAAQgE3AgQgAEEONgIcIABBjIHAADYCGCAAIABBGGo2AgAjAEEgayIBJAAgAUEBOgAYIAFBnIHAADYCFCABIAA2AhAgAUGsgcAANgIMIAFBrIHAADYCCAALCwMAAQsNAELX1o7QiJnYj7V/CwvDAQEAQYCAwAALuQFHQktMTVFWTkNSL1VzZXJzL3BhdWxiZWxsYW15Ly5jYXJnby9naXQvY2hlY2tvdXRzL3JzLXN0ZWxsYXItY29udHJhY3QtZW52LWE3NDU5OGJlZmVmNTk3OGQvNmIzNmZkNS9zdGVsbGFyLWNvbnRyYWN0LWVudi1jb21tb24vc3JjL3N5bWJvbC5yc2V4cGxpY2l0IHBhbmljAAAKABAAggAAAFoAAAAXAAAAAQAAAAAAAAABAAAAAg==";

/// Engine settings for the host.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Fuel given to the store before instantiation. `None` disables metering.
    pub fuel: Option<u64>,
    pub max_wasm_stack: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            fuel: None,
            max_wasm_stack: 512 * 1024,
        }
    }
}

/// Arguments of a single `invoke_contract` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub contract_id: String,
    /// The contract module, base64 encoded.
    pub module: String,
    pub function: String,
    /// Call arguments as base64 XDR.
    pub args: String,
}

impl Default for Invocation {
    fn default() -> Self {
        Self {
            contract_id: DEFAULT_CONTRACT_ID.into(),
            module: PIXEL_NFT_WASM.into(),
            function: DEFAULT_FUNCTION.into(),
            args: String::new(),
        }
    }
}

impl Invocation {
    pub fn new(
        contract_id: impl Into<String>,
        module: impl Into<String>,
        function: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        Self {
            contract_id: contract_id.into(),
            module: module.into(),
            function: function.into(),
            args: args.into(),
        }
    }

    /// Replaces the contract with raw module bytes.
    pub fn with_module_bytes(mut self, wasm: impl AsRef<[u8]>) -> Self {
        self.module = general_purpose::STANDARD.encode(wasm);
        self
    }
}
