//! Owning principal lookup, cached per owner id.

use std::collections::HashMap;
use std::fs::Metadata;
use std::path::Path;
use std::sync::Mutex;

use crate::error::ProbeError;

/// Source of the `Owner` field. A failure leaves the field empty and is reported per file.
pub trait OwnerProvider: Send + Sync {
    fn owner(&self, path: &Path, meta: &Metadata) -> Result<String, ProbeError>;
}

/// Platform owner lookup. Shared by all probe workers.
///
/// Unix maps the uid to a user name. Windows reads the owner SID from the security descriptor
/// and renders it as `DOMAIN\name`. Lookups are cached by uid / SID string.
#[derive(Default)]
pub struct OwnerResolver {
    cache: Mutex<HashMap<String, String>>,
}

impl OwnerResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn cached(
        &self,
        key: String,
        resolve: impl FnOnce() -> Result<String, ProbeError>,
    ) -> Result<String, ProbeError> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| ProbeError::Owner("owner cache poisoned".to_string()))?;
        if let Some(name) = cache.get(&key) {
            return Ok(name.clone());
        }
        let name = resolve()?;
        cache.insert(key, name.clone());
        Ok(name)
    }
}

impl OwnerProvider for OwnerResolver {
    /// A uid without a passwd entry resolves to the numeric id.
    #[cfg(unix)]
    fn owner(&self, _path: &Path, meta: &Metadata) -> Result<String, ProbeError> {
        use std::os::unix::fs::MetadataExt;
        let uid = meta.uid();
        self.cached(uid.to_string(), || {
            Ok(uzers::get_user_by_uid(uid)
                .map(|u| u.name().to_string_lossy().into_owned())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| uid.to_string()))
        })
    }

    /// An unmapped SID resolves to its string form (`S-1-5-...`).
    #[cfg(windows)]
    fn owner(&self, path: &Path, _meta: &Metadata) -> Result<String, ProbeError> {
        let descriptor = windows_owner::OwnerDescriptor::read(path)?;
        let sid = descriptor.sid_string()?;
        self.cached(sid.clone(), || {
            Ok(descriptor.account_name().unwrap_or(sid))
        })
    }

    #[cfg(not(any(unix, windows)))]
    fn owner(&self, _path: &Path, _meta: &Metadata) -> Result<String, ProbeError> {
        let _ = &self.cache;
        Err(ProbeError::OwnerUnsupported)
    }
}

#[cfg(windows)]
mod windows_owner {
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use windows::Win32::Foundation::{ERROR_SUCCESS, HLOCAL, LocalFree};
    use windows::Win32::Security::Authorization::{
        ConvertSidToStringSidW, GetNamedSecurityInfoW, SE_FILE_OBJECT,
    };
    use windows::Win32::Security::{
        LookupAccountSidW, OWNER_SECURITY_INFORMATION, PSECURITY_DESCRIPTOR, PSID, SID_NAME_USE,
    };
    use windows::core::{PCWSTR, PWSTR};

    use crate::error::ProbeError;

    const NAME_CAP: usize = 256;

    /// Security descriptor holding the owner SID; freed on drop.
    pub struct OwnerDescriptor {
        descriptor: PSECURITY_DESCRIPTOR,
        owner: PSID,
    }

    impl OwnerDescriptor {
        pub fn read(path: &Path) -> Result<Self, ProbeError> {
            let wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();
            let mut owner = PSID::default();
            let mut descriptor = PSECURITY_DESCRIPTOR::default();
            // SAFETY: `wide` is NUL-terminated and outlives the call; out pointers are valid.
            let status = unsafe {
                GetNamedSecurityInfoW(
                    PCWSTR(wide.as_ptr()),
                    SE_FILE_OBJECT,
                    OWNER_SECURITY_INFORMATION,
                    Some(&mut owner),
                    None,
                    None,
                    None,
                    &mut descriptor,
                )
            };
            if status != ERROR_SUCCESS {
                return Err(ProbeError::Owner(format!(
                    "GetNamedSecurityInfoW failed ({})",
                    status.0
                )));
            }
            Ok(Self { descriptor, owner })
        }

        pub fn sid_string(&self) -> Result<String, ProbeError> {
            let mut raw = PWSTR::null();
            // SAFETY: `owner` points into `descriptor`, which is alive.
            unsafe { ConvertSidToStringSidW(self.owner, &mut raw) }
                .map_err(|e| ProbeError::Owner(e.to_string()))?;
            // SAFETY: on success `raw` is a NUL-terminated LocalAlloc string.
            let sid = unsafe { raw.to_string() };
            unsafe {
                let _ = LocalFree(HLOCAL(raw.0.cast()));
            }
            sid.map_err(|e| ProbeError::Owner(e.to_string()))
        }

        /// `DOMAIN\name`, or just `name` for accounts without a domain.
        pub fn account_name(&self) -> Option<String> {
            let mut name = [0u16; NAME_CAP];
            let mut domain = [0u16; NAME_CAP];
            let mut name_len = NAME_CAP as u32;
            let mut domain_len = NAME_CAP as u32;
            let mut use_kind = SID_NAME_USE::default();
            // SAFETY: buffers and their lengths match; `owner` is alive.
            unsafe {
                LookupAccountSidW(
                    PCWSTR::null(),
                    self.owner,
                    PWSTR(name.as_mut_ptr()),
                    &mut name_len,
                    PWSTR(domain.as_mut_ptr()),
                    &mut domain_len,
                    &mut use_kind,
                )
            }
            .ok()?;
            let name = String::from_utf16_lossy(&name[..name_len as usize]);
            let domain = String::from_utf16_lossy(&domain[..domain_len as usize]);
            if name.is_empty() {
                None
            } else if domain.is_empty() {
                Some(name)
            } else {
                Some(format!("{domain}\\{name}"))
            }
        }
    }

    impl Drop for OwnerDescriptor {
        fn drop(&mut self) {
            // SAFETY: allocated by GetNamedSecurityInfoW and freed exactly once.
            unsafe {
                let _ = LocalFree(HLOCAL(self.descriptor.0));
            }
        }
    }
}
