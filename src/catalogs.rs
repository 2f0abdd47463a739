//! Static option catalogs consumed by the wizard step payloads and the
//! summary assembler. Labels may embed a masculine/feminine alternation as a
//! trailing `.suffix` marker (e.g. "Curieux.se"), resolved at render time.

use serde_json::{json, Value};

use crate::models::profile::{
    AgeBracket, Gender, HairType, HeightBracket, PetType, RelationType, ToyType,
};
use crate::models::wizard::WizardStep;

pub type Catalog = &'static [(&'static str, &'static str)];

pub const NICKNAMES: Catalog = &[
    ("ma-puce", "Ma puce"),
    ("mon-coeur", "Mon cœur"),
    ("loulou", "Loulou"),
    ("chaton", "Chaton"),
    ("mon-tresor", "Mon trésor"),
    ("petite-crapule", "Petite crapule"),
];

pub const SUPERPOWERS: Catalog = &[
    ("courageous", "Courageux.se"),
    ("curious", "Curieux.se"),
    ("generous", "Généreux.se"),
    ("mischievous", "Malicieux.se"),
    ("determined", "Déterminé.e"),
    ("funny", "Rigolo.te"),
    ("kind", "Gentil.le"),
    ("polite", "Poli.e"),
    ("gourmet", "Gourmand.e"),
    ("dreamy", "Dans la lune"),
    ("shy", "Timide"),
    ("energetic", "Dynamique"),
];

pub const PASSIONS: Catalog = &[
    ("drawing", "Le dessin"),
    ("dance", "La danse"),
    ("football", "Le football"),
    ("reading", "La lecture"),
    ("cooking", "La cuisine"),
    ("music", "La musique"),
    ("animals", "Les animaux"),
    ("space", "L'espace"),
    ("nature", "La nature"),
    ("dinosaurs", "Les dinosaures"),
];

pub const CHALLENGES: Catalog = &[
    ("dark", "La peur du noir"),
    ("sleep-alone", "Dormir seul.e"),
    ("share", "Partager"),
    ("patience", "La patience"),
    ("vegetables", "Manger des légumes"),
    ("school-start", "La rentrée à l'école"),
    ("new-sibling", "L'arrivée d'un petit frère ou d'une petite sœur"),
    ("confidence", "Prendre confiance en soi"),
];

pub const SKIN_COLORS: Catalog = &[
    ("fair", "Claire"),
    ("light", "Légèrement hâlée"),
    ("tan", "Mate"),
    ("brown", "Foncée"),
    ("dark", "Très foncée"),
];

pub const EYE_COLORS: Catalog = &[
    ("blue", "Bleus"),
    ("green", "Verts"),
    ("brown", "Marron"),
    ("black", "Noirs"),
    ("gray", "Gris"),
    ("hazel", "Noisette"),
];

pub const HAIR_COLORS: Catalog = &[
    ("blond", "Blonds"),
    ("chestnut", "Châtains"),
    ("brown", "Bruns"),
    ("red", "Roux"),
    ("black", "Noirs"),
];

pub const PET_TRAITS: Catalog = &[
    ("playful", "Joueur"),
    ("greedy", "Gourmand"),
    ("sleepy", "Dormeur"),
    ("cuddly", "Câlin"),
    ("noisy", "Bavard"),
    ("lazy", "Paresseux"),
    ("protective", "Protecteur"),
    ("other", "Autre"),
];

pub const TOY_ROLES: Catalog = &[
    ("night-guardian", "Protecteur de la nuit"),
    ("confidant", "Confident"),
    ("adventure-buddy", "Compagnon d'aventure"),
    ("comforter", "Consolateur"),
    ("story-hero", "Héros de l'histoire"),
    ("other", "Autre"),
];

pub const WORLDS: Catalog = &[
    ("space", "L'espace"),
    ("dinosaurs", "Les dinosaures"),
    ("pirates", "Les pirates"),
    ("fairies", "Les fées"),
    ("superheroes", "Les super-héros"),
    ("jungle", "La jungle"),
    ("ocean", "L'océan"),
    ("castles", "Les châteaux forts"),
];

pub const TOPICS: Catalog = &[
    ("volcanoes", "Les volcans"),
    ("planets", "Les planètes"),
    ("wild-animals", "Les animaux sauvages"),
    ("ocean-depths", "Les fonds marins"),
    ("human-body", "Le corps humain"),
    ("insects", "Les insectes"),
];

pub fn label_for(catalog: Catalog, key: &str) -> Option<&'static str> {
    catalog
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| *label)
}

/// Catalog lookup with the display fallback the formatters rely on: an
/// unknown key renders as the raw key, never as an error.
pub fn label_or_key<'a>(catalog: Catalog, key: &'a str) -> &'a str {
    label_for(catalog, key).unwrap_or(key)
}

/// Height labels carry a full grammatical form per gender rather than a
/// marker, since the neutral phrasing is a different word shape entirely.
pub fn height_label(bracket: HeightBracket, gender: Gender) -> &'static str {
    match (bracket, gender) {
        (HeightBracket::Small, Gender::Boy) => "Petit",
        (HeightBracket::Small, Gender::Girl) => "Petite",
        (HeightBracket::Small, Gender::Neutral) => "De petite taille",
        (HeightBracket::Medium, Gender::Boy) => "Moyen",
        (HeightBracket::Medium, Gender::Girl) => "Moyenne",
        (HeightBracket::Medium, Gender::Neutral) => "De taille moyenne",
        (HeightBracket::Tall, Gender::Boy) => "Grand",
        (HeightBracket::Tall, Gender::Girl) => "Grande",
        (HeightBracket::Tall, Gender::Neutral) => "De grande taille",
    }
}

fn catalog_json(catalog: Catalog) -> Value {
    Value::Array(
        catalog
            .iter()
            .map(|(key, label)| json!({ "key": key, "label": label }))
            .collect(),
    )
}

fn entries_json<T, I>(values: I, key: fn(&T) -> &'static str, label: fn(&T) -> &'static str) -> Value
where
    I: IntoIterator<Item = T>,
{
    Value::Array(
        values
            .into_iter()
            .map(|v| json!({ "key": key(&v), "label": label(&v) }))
            .collect(),
    )
}

fn relation_types_json() -> Value {
    entries_json(RelationType::ALL, RelationType::as_str, RelationType::label)
}

fn pet_types_json() -> Value {
    entries_json(PetType::ALL, PetType::as_str, PetType::label)
}

fn toy_types_json() -> Value {
    entries_json(ToyType::ALL, ToyType::as_str, ToyType::label)
}

fn hair_types_json() -> Value {
    entries_json(HairType::ALL, HairType::as_str, HairType::label)
}

fn age_brackets_json() -> Value {
    entries_json(AgeBracket::ALL, AgeBracket::as_str, AgeBracket::label)
}

fn genders_json() -> Value {
    entries_json(Gender::ALL, Gender::as_str, Gender::label)
}

fn heights_json() -> Value {
    // Neutral forms; the summary swaps in the gendered form once known.
    entries_json(HeightBracket::ALL, HeightBracket::as_str, |h| {
        height_label(*h, Gender::Neutral)
    })
}

/// Everything the frontend needs to render option pickers.
pub fn all_catalogs() -> Value {
    json!({
        "nicknames": catalog_json(NICKNAMES),
        "superpowers": catalog_json(SUPERPOWERS),
        "passions": catalog_json(PASSIONS),
        "challenges": catalog_json(CHALLENGES),
        "skin_colors": catalog_json(SKIN_COLORS),
        "eye_colors": catalog_json(EYE_COLORS),
        "hair_colors": catalog_json(HAIR_COLORS),
        "hair_types": hair_types_json(),
        "heights": heights_json(),
        "age_brackets": age_brackets_json(),
        "genders": genders_json(),
        "relation_types": relation_types_json(),
        "pet_types": pet_types_json(),
        "pet_traits": catalog_json(PET_TRAITS),
        "toy_types": toy_types_json(),
        "toy_roles": catalog_json(TOY_ROLES),
        "worlds": catalog_json(WORLDS),
        "topics": catalog_json(TOPICS),
    })
}

/// The catalog slices a given step's form needs — the step's "props".
pub fn step_props(step: WizardStep) -> Value {
    match step {
        WizardStep::BasicInfo => json!({
            "nicknames": catalog_json(NICKNAMES),
            "skin_colors": catalog_json(SKIN_COLORS),
            "eye_colors": catalog_json(EYE_COLORS),
            "hair_colors": catalog_json(HAIR_COLORS),
            "hair_types": hair_types_json(),
            "heights": heights_json(),
            "age_brackets": age_brackets_json(),
            "genders": genders_json(),
        }),
        WizardStep::Personality => json!({
            "superpowers": catalog_json(SUPERPOWERS),
            "passions": catalog_json(PASSIONS),
            "challenges": catalog_json(CHALLENGES),
        }),
        WizardStep::Family => json!({
            "relation_types": relation_types_json(),
        }),
        WizardStep::Pets => json!({
            "pet_types": pet_types_json(),
            "pet_traits": catalog_json(PET_TRAITS),
        }),
        WizardStep::Toys => json!({
            "toy_types": toy_types_json(),
            "toy_roles": catalog_json(TOY_ROLES),
        }),
        WizardStep::Worlds => json!({
            "worlds": catalog_json(WORLDS),
            "topics": catalog_json(TOPICS),
        }),
        WizardStep::Summary => json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_finds_known_keys() {
        assert_eq!(label_for(SUPERPOWERS, "curious"), Some("Curieux.se"));
        assert_eq!(label_for(WORLDS, "pirates"), Some("Les pirates"));
    }

    #[test]
    fn unknown_keys_fall_back_to_raw_value() {
        assert_eq!(label_for(PASSIONS, "quidditch"), None);
        assert_eq!(label_or_key(PASSIONS, "quidditch"), "quidditch");
    }

    #[test]
    fn catalog_keys_are_unique() {
        for catalog in [
            NICKNAMES, SUPERPOWERS, PASSIONS, CHALLENGES, SKIN_COLORS, EYE_COLORS, HAIR_COLORS,
            PET_TRAITS, TOY_ROLES, WORLDS, TOPICS,
        ] {
            let mut keys: Vec<_> = catalog.iter().map(|(k, _)| *k).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), catalog.len());
        }
    }

    #[test]
    fn height_labels_vary_by_gender() {
        use crate::models::profile::{Gender, HeightBracket};
        assert_eq!(height_label(HeightBracket::Small, Gender::Boy), "Petit");
        assert_eq!(height_label(HeightBracket::Small, Gender::Girl), "Petite");
        assert_eq!(
            height_label(HeightBracket::Small, Gender::Neutral),
            "De petite taille"
        );
    }

    #[test]
    fn every_step_has_props() {
        for index in 0..=crate::models::wizard::MAX_STEP {
            let step = WizardStep::for_index(index, crate::models::wizard::WizardMode::Full)
                .expect("full mode covers all indices");
            assert!(step_props(step).is_object());
        }
    }
}
