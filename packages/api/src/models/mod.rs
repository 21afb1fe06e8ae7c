//! Response shapes composed by the handlers. Stored records live in
//! [`store::models`]; these only combine them for the client.

use serde::{Deserialize, Serialize};
use store::models::{Family, MemberWithUser, Note, NoteWithAuthor, Pet, PetFile, Vaccination};
use uuid::Uuid;

/// `GET /api/families/{id}`: the family with its roster.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyWithMembers {
    #[serde(flatten)]
    pub family: Family,
    pub members: Vec<MemberWithUser>,
}

/// Unauthenticated read-only view of a pet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicPetProfile {
    pub pet: Pet,
    pub files: Vec<PetFile>,
    pub notes: Vec<PublicNote>,
    pub vaccinations: Vec<Vaccination>,
}

/// Author as shown to anonymous viewers: a name and nothing that identifies the
/// account.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAuthor {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicNote {
    #[serde(flatten)]
    pub note: Note,
    pub author: PublicAuthor,
}

impl From<NoteWithAuthor> for PublicNote {
    fn from(NoteWithAuthor { note, author }: NoteWithAuthor) -> Self {
        Self {
            note,
            author: PublicAuthor {
                first_name: author.first_name,
                last_name: author.last_name,
            },
        }
    }
}

pub const FAMILY_INVITE_TYPE: &str = "family-invite";

/// Payload encoded into a family invite QR code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteData {
    #[serde(rename = "type")]
    pub kind: String,
    pub family_id: Uuid,
    pub family_name: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrInvite {
    /// `data:image/svg+xml;base64,...`
    pub qr_code: String,
    pub invite_data: InviteData,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadTicket {
    #[serde(rename = "uploadURL")]
    pub upload_url: String,
    #[serde(rename = "objectPath")]
    pub object_path: String,
}
