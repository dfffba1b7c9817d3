//! Query registries of the list endpoints, one module per entity type

pub mod accreditation;
pub mod athlete;
pub mod athlete_photo;
pub mod club;
pub mod club_coach;
pub mod user;

use std::fmt;
use std::str::FromStr;

use bfg_query::EntitySchema;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Accreditation,
    Athlete,
    AthletePhoto,
    Club,
    ClubCoach,
    User,
}

impl EntityKind {
    pub const ALL: [EntityKind; 6] = [
        EntityKind::Accreditation,
        EntityKind::Athlete,
        EntityKind::AthletePhoto,
        EntityKind::Club,
        EntityKind::ClubCoach,
        EntityKind::User,
    ];

    pub fn schema(&self) -> &'static EntitySchema {
        match self {
            EntityKind::Accreditation => accreditation::schema(),
            EntityKind::Athlete => athlete::schema(),
            EntityKind::AthletePhoto => athlete_photo::schema(),
            EntityKind::Club => club::schema(),
            EntityKind::ClubCoach => club_coach::schema(),
            EntityKind::User => user::schema(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Accreditation => "accreditation",
            EntityKind::Athlete => "athlete",
            EntityKind::AthletePhoto => "athletePhoto",
            EntityKind::Club => "club",
            EntityKind::ClubCoach => "clubCoach",
            EntityKind::User => "user",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    /// Accepts the entity name case-insensitively, with or without `-`/`_`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.name().to_ascii_lowercase() == normalized)
            .ok_or_else(|| Error::UnknownEntity(s.to_string()))
    }
}
