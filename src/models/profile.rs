use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Boy,
    Girl,
    #[default]
    Neutral,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Boy, Gender::Girl, Gender::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Boy => "boy",
            Gender::Girl => "girl",
            Gender::Neutral => "neutral",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Boy => "Garçon",
            Gender::Girl => "Fille",
            Gender::Neutral => "Non précisé",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgeBracket {
    #[serde(rename = "0-2")]
    ZeroToTwo,
    #[default]
    #[serde(rename = "3-5")]
    ThreeToFive,
    #[serde(rename = "6-8")]
    SixToEight,
    #[serde(rename = "9-12")]
    NineToTwelve,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 4] = [
        AgeBracket::ZeroToTwo,
        AgeBracket::ThreeToFive,
        AgeBracket::SixToEight,
        AgeBracket::NineToTwelve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBracket::ZeroToTwo => "0-2",
            AgeBracket::ThreeToFive => "3-5",
            AgeBracket::SixToEight => "6-8",
            AgeBracket::NineToTwelve => "9-12",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeBracket::ZeroToTwo => "0 à 2 ans",
            AgeBracket::ThreeToFive => "3 à 5 ans",
            AgeBracket::SixToEight => "6 à 8 ans",
            AgeBracket::NineToTwelve => "9 à 12 ans",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HairType {
    Straight,
    Wavy,
    Curly,
    Coily,
    Bald,
}

impl HairType {
    pub const ALL: [HairType; 5] = [
        HairType::Straight,
        HairType::Wavy,
        HairType::Curly,
        HairType::Coily,
        HairType::Bald,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HairType::Straight => "straight",
            HairType::Wavy => "wavy",
            HairType::Curly => "curly",
            HairType::Coily => "coily",
            HairType::Bald => "bald",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HairType::Straight => "Lisses",
            HairType::Wavy => "Ondulés",
            HairType::Curly => "Bouclés",
            HairType::Coily => "Crépus",
            HairType::Bald => "Peu de cheveux",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightBracket {
    Small,
    Medium,
    Tall,
}

impl HeightBracket {
    pub const ALL: [HeightBracket; 3] =
        [HeightBracket::Small, HeightBracket::Medium, HeightBracket::Tall];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeightBracket::Small => "small",
            HeightBracket::Medium => "medium",
            HeightBracket::Tall => "tall",
        }
    }
}

/// Nickname is a tagged choice: absent, picked from the catalog, or free text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NicknameChoice {
    #[default]
    None,
    Predefined { value: String },
    Custom { text: String },
}

/// Skin/eye/hair colors: a catalog swatch key or free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorChoice {
    Preset { value: String },
    Custom { text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Mother,
    Father,
    Sister,
    Brother,
    Grandmother,
    Grandfather,
    Aunt,
    Uncle,
    Other,
}

impl RelationType {
    pub const ALL: [RelationType; 9] = [
        RelationType::Mother,
        RelationType::Father,
        RelationType::Sister,
        RelationType::Brother,
        RelationType::Grandmother,
        RelationType::Grandfather,
        RelationType::Aunt,
        RelationType::Uncle,
        RelationType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Mother => "mother",
            RelationType::Father => "father",
            RelationType::Sister => "sister",
            RelationType::Brother => "brother",
            RelationType::Grandmother => "grandmother",
            RelationType::Grandfather => "grandfather",
            RelationType::Aunt => "aunt",
            RelationType::Uncle => "uncle",
            RelationType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RelationType::Mother => "Maman",
            RelationType::Father => "Papa",
            RelationType::Sister => "Sœur",
            RelationType::Brother => "Frère",
            RelationType::Grandmother => "Mamie",
            RelationType::Grandfather => "Papi",
            RelationType::Aunt => "Tante",
            RelationType::Uncle => "Oncle",
            RelationType::Other => "Autre",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PetType {
    Dog,
    Cat,
    Rabbit,
    Bird,
    Fish,
    Hamster,
    Horse,
    Other,
}

impl PetType {
    pub const ALL: [PetType; 8] = [
        PetType::Dog,
        PetType::Cat,
        PetType::Rabbit,
        PetType::Bird,
        PetType::Fish,
        PetType::Hamster,
        PetType::Horse,
        PetType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PetType::Dog => "dog",
            PetType::Cat => "cat",
            PetType::Rabbit => "rabbit",
            PetType::Bird => "bird",
            PetType::Fish => "fish",
            PetType::Hamster => "hamster",
            PetType::Horse => "horse",
            PetType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PetType::Dog => "Chien",
            PetType::Cat => "Chat",
            PetType::Rabbit => "Lapin",
            PetType::Bird => "Oiseau",
            PetType::Fish => "Poisson",
            PetType::Hamster => "Hamster",
            PetType::Horse => "Cheval",
            PetType::Other => "Autre",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToyType {
    Plush,
    Doll,
    Figurine,
    Blanket,
    Robot,
    Vehicle,
    Other,
}

impl ToyType {
    pub const ALL: [ToyType; 7] = [
        ToyType::Plush,
        ToyType::Doll,
        ToyType::Figurine,
        ToyType::Blanket,
        ToyType::Robot,
        ToyType::Vehicle,
        ToyType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToyType::Plush => "plush",
            ToyType::Doll => "doll",
            ToyType::Figurine => "figurine",
            ToyType::Blanket => "blanket",
            ToyType::Robot => "robot",
            ToyType::Vehicle => "vehicle",
            ToyType::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ToyType::Plush => "Peluche",
            ToyType::Doll => "Poupée",
            ToyType::Figurine => "Figurine",
            ToyType::Blanket => "Doudou",
            ToyType::Robot => "Robot",
            ToyType::Vehicle => "Véhicule",
            ToyType::Other => "Autre",
        }
    }
}

/// One family member appearing in the child's stories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relative {
    pub id: Uuid,
    pub relation: RelationType,
    /// Free-text label shown in place of "Autre" when relation is `other`.
    #[serde(default)]
    pub other_type_name: Option<String>,
    #[serde(default)]
    pub gender: Gender,
    pub first_name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub hair_color: Option<String>,
    #[serde(default)]
    pub glasses: Option<bool>,
    #[serde(default)]
    pub traits: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FamilyData {
    #[serde(default)]
    pub relatives: Vec<Relative>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: Uuid,
    pub name: String,
    pub pet_type: PetType,
    #[serde(default)]
    pub other_type_name: Option<String>,
    /// Catalog keys; may contain "other", resolved via `custom_trait`.
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub custom_trait: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PetsData {
    #[serde(default)]
    pub has_pets: bool,
    #[serde(default)]
    pub pets: Vec<Pet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Toy {
    pub id: Uuid,
    pub name: String,
    pub toy_type: ToyType,
    #[serde(default)]
    pub appearance: Option<String>,
    /// Catalog keys; may contain "other", resolved via `custom_role`.
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub custom_role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToysData {
    #[serde(default)]
    pub has_toys: bool,
    #[serde(default)]
    pub toys: Vec<Toy>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldsData {
    /// Favorite-world catalog keys, plus up to two free-text slots.
    #[serde(default)]
    pub worlds: Vec<String>,
    #[serde(default)]
    pub custom_world_one: Option<String>,
    #[serde(default)]
    pub custom_world_two: Option<String>,
    /// Discovery-topic catalog keys, plus up to two free-text slots.
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub custom_topic_one: Option<String>,
    #[serde(default)]
    pub custom_topic_two: Option<String>,
}

/// The aggregate built step by step in the wizard and stored whole as JSONB.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChildProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub nickname: NicknameChoice,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub age_bracket: AgeBracket,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub skin_color: Option<ColorChoice>,
    #[serde(default)]
    pub eye_color: Option<ColorChoice>,
    #[serde(default)]
    pub hair_color: Option<ColorChoice>,
    #[serde(default)]
    pub hair_type: Option<HairType>,
    #[serde(default)]
    pub glasses: bool,
    #[serde(default)]
    pub height: Option<HeightBracket>,
    #[serde(default)]
    pub superpowers: Vec<String>,
    #[serde(default)]
    pub passions: Vec<String>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub family: FamilyData,
    #[serde(default)]
    pub pets: PetsData,
    #[serde(default)]
    pub toys: ToysData,
    #[serde(default)]
    pub worlds: WorldsData,
}

/// DB row struct — scalar columns for listing, the full document as JSONB.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChildRecord {
    pub id: Uuid,
    pub family_id: Uuid,
    pub created_by: Uuid,
    pub first_name: String,
    pub gender: String,
    pub age_bracket: String,
    pub profile: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_choices_serialize_with_kind_tag() {
        let nickname = NicknameChoice::Custom {
            text: "Pirate".into(),
        };
        let json = serde_json::to_value(&nickname).unwrap();
        assert_eq!(json["kind"], "custom");
        assert_eq!(json["text"], "Pirate");

        let color: ColorChoice = serde_json::from_value(serde_json::json!({
            "kind": "preset", "value": "blue"
        }))
        .unwrap();
        assert_eq!(
            color,
            ColorChoice::Preset {
                value: "blue".into()
            }
        );
    }

    #[test]
    fn age_bracket_uses_range_names() {
        let json = serde_json::to_string(&AgeBracket::SixToEight).unwrap();
        assert_eq!(json, "\"6-8\"");
        let parsed: AgeBracket = serde_json::from_str("\"0-2\"").unwrap();
        assert_eq!(parsed, AgeBracket::ZeroToTwo);
    }

    #[test]
    fn empty_profile_deserializes_from_empty_document() {
        // Le brouillon démarre vide ; chaque champ doit avoir un défaut.
        let profile: ChildProfile = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(profile, ChildProfile::default());
        assert_eq!(profile.nickname, NicknameChoice::None);
        assert!(!profile.pets.has_pets);
        assert!(profile.family.relatives.is_empty());
    }

    #[test]
    fn profile_document_roundtrip() {
        let mut profile = ChildProfile::default();
        profile.first_name = "Léa".into();
        profile.gender = Gender::Girl;
        profile.pets = PetsData {
            has_pets: true,
            pets: vec![Pet {
                id: Uuid::new_v4(),
                name: "Caramel".into(),
                pet_type: PetType::Other,
                other_type_name: Some("Tortue".into()),
                traits: vec!["calin".into()],
                custom_trait: None,
            }],
        };

        let doc = serde_json::to_value(&profile).unwrap();
        let back: ChildProfile = serde_json::from_value(doc).unwrap();
        assert_eq!(back, profile);
    }
}
