//! Secret Objects
//!
//! A secret is a named pair of values: the current value and the value it
//! replaced. Each value carries the time it was set. Storing a new current
//! value demotes the previous current value to old in the same step.

use crate::ex::query_system_time;
use crate::se::descriptor::create_object_security_descriptor;
use crate::se::{GenericMapping, SecurityDescriptor};
use crate::status::{LsaResult, NtStatus};

/// Secret access rights
pub mod secret_access {
    pub const SECRET_SET_VALUE: u32 = 0x00000001;
    pub const SECRET_QUERY_VALUE: u32 = 0x00000002;
    pub const SECRET_ALL_ACCESS: u32 = 0x000F0003;
}

use secret_access::*;

/// Generic mapping for secret objects
pub const SECRET_GENERIC_MAPPING: GenericMapping = GenericMapping {
    generic_read: 0x00020002,
    generic_write: 0x00020001,
    generic_execute: 0x00020000,
    generic_all: SECRET_ALL_ACCESS,
};

/// Descriptor given to a newly created secret
///
/// Only System and Administrators may touch secrets.
pub fn default_secret_descriptor() -> SecurityDescriptor {
    create_object_security_descriptor(SECRET_ALL_ACCESS, &[])
}

/// Validate a secret name
pub fn validate_secret_name(name: &str, max_len: usize) -> LsaResult<()> {
    if name.is_empty() || name.contains('\\') {
        return Err(NtStatus::InvalidParameter);
    }
    if name.chars().count() > max_len {
        return Err(NtStatus::NameTooLong);
    }
    Ok(())
}

/// Key under which a secret name is indexed
pub fn secret_key(name: &str) -> String {
    name.to_uppercase()
}

/// A stored value and the time it was set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretValue {
    pub data: Vec<u8>,
    /// NT system time
    pub set_time: i64,
}

/// Both values of a secret as returned by a query
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SecretValues {
    pub current: Option<SecretValue>,
    pub old: Option<SecretValue>,
}

/// One secret object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    /// Name as given at creation
    pub name: String,
    pub current: Option<SecretValue>,
    pub old: Option<SecretValue>,
    /// Security descriptor
    pub descriptor: SecurityDescriptor,
}

impl Secret {
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            current: None,
            old: None,
            descriptor: default_secret_descriptor(),
        }
    }

    /// Store new values
    ///
    /// - current only: the previous current value becomes old
    /// - current and old: both are replaced as given
    /// - old only: only the old value is replaced
    pub fn set(
        &mut self,
        current: Option<Vec<u8>>,
        old: Option<Vec<u8>>,
        max_value_len: usize,
    ) -> LsaResult<()> {
        if current.is_none() && old.is_none() {
            return Err(NtStatus::InvalidParameter);
        }
        let too_long = |value: &Option<Vec<u8>>| value.as_ref().map_or(false, |v| v.len() > max_value_len);
        if too_long(&current) || too_long(&old) {
            return Err(NtStatus::InvalidParameter);
        }

        let now = query_system_time();
        match (current, old) {
            (Some(current), None) => {
                self.old = self.current.take();
                self.current = Some(SecretValue {
                    data: current,
                    set_time: now,
                });
            }
            (current, old) => {
                if let Some(old) = old {
                    self.old = Some(SecretValue {
                        data: old,
                        set_time: now,
                    });
                }
                if let Some(current) = current {
                    self.current = Some(SecretValue {
                        data: current,
                        set_time: now,
                    });
                }
            }
        }
        Ok(())
    }

    /// Current and old values
    pub fn query(&self) -> SecretValues {
        SecretValues {
            current: self.current.clone(),
            old: self.old.clone(),
        }
    }
}
