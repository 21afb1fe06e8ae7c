//! # Domain models for pet families
//!
//! Defines the records returned by [`crate::Storage`] and the inputs it accepts.
//! Every type is `Serialize + Deserialize` with camelCase field names so it can go
//! straight out over the JSON API.
//!
//! ## Types
//!
//! | Module | Records | Inputs |
//! |--------|---------|--------|
//! | [`user`] | [`User`], [`UserInfo`] | [`NewLocalUser`], [`FederatedProfile`] |
//! | [`family`] | [`Family`], [`FamilyMember`], [`MembershipWithFamily`], [`MemberWithUser`] | [`NewFamily`] |
//! | [`pet`] | [`Pet`] | [`NewPet`], [`PetPatch`] |
//! | [`note`] | [`Note`], [`NoteWithAuthor`], [`NoteWithAuthorAndPet`] | [`NewNote`], [`NotePatch`] |
//! | [`file`] | [`PetFile`] | [`NewPetFile`] |
//! | [`vaccination`] | [`Vaccination`], [`VaccinationWithPet`] | [`NewVaccination`], [`VaccinationPatch`] |
//!
//! The joined records (`*With*`) flatten the primary record and attach the related
//! ones, matching the shape the web client consumes.
//!
//! ## Text enums
//!
//! [`FamilyRole`], [`NoteType`], [`Mood`] and [`Frequency`] are stored as `TEXT`
//! columns. With the `postgres` feature they implement `sqlx::Type`, `Encode` and
//! `Decode` by delegating to `&str`, so they bind and decode directly.

use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// A string did not name a variant of one of the text enums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Implements `as_str`, `FromStr`, `Display` and (with `postgres`) the sqlx text
/// codec for a fieldless enum.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::str::FromStr for $ty {
            type Err = $crate::models::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err($crate::models::ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        #[cfg(feature = "postgres")]
        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <&str as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <&str as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let text = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(text.parse()?)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <&str as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

pub(crate) use text_enum;

/// Patch field codec: absent keeps the stored value (`None`), `null` clears it
/// (`Some(None)`), anything else sets it. Use with `#[serde(default)]`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub mod family;
pub mod file;
pub mod note;
pub mod pet;
pub mod user;
pub mod vaccination;

pub use family::{Family, FamilyMember, FamilyRole, MemberWithUser, MembershipWithFamily, NewFamily};
pub use file::{NewPetFile, PetFile};
pub use note::{Frequency, Mood, NewNote, Note, NotePatch, NoteType, NoteWithAuthor, NoteWithAuthorAndPet};
pub use pet::{NewPet, Pet, PetPatch};
pub use user::{FederatedProfile, NewLocalUser, User, UserInfo, LOCAL_PROVIDER};
pub use vaccination::{NewVaccination, Vaccination, VaccinationPatch, VaccinationWithPet};
