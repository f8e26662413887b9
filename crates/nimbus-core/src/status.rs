//! Lifecycle status enums.
//!
//! Platform resources report their lifecycle as an upper-case string. The
//! [`status_enum!`](crate::status_enum) macro generates a closed enum for the
//! known values plus an `Unknown` catch-all, so a client keeps working when
//! the platform adds a status. Every generated enum must declare an `Error`
//! variant: that is the failure status the wait helpers stop on.

/// Generate a lifecycle status enum.
///
/// ```
/// nimbus_core::status_enum! {
///     /// Status of a volume.
///     VolumeStatus {
///         /// Ready for use
///         Available => "AVAILABLE",
///         /// Provisioning failed
///         Error => "ERROR",
///     }
/// }
///
/// assert_eq!(VolumeStatus::Available.as_str(), "AVAILABLE");
/// assert!(VolumeStatus::Error.is_failed());
/// ```
#[macro_export]
macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize,
        )]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
            /// Status not known to this client version
            #[serde(rename = "UNKNOWN")]
            #[serde(other)]
            Unknown,
        }

        impl $name {
            /// Wire representation.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Unknown => "UNKNOWN",
                }
            }

            /// True for the explicit failure status.
            #[must_use]
            pub const fn is_failed(&self) -> bool {
                matches!(self, Self::Error)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}
