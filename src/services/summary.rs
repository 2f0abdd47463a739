//! Read-only projection of a child profile into human-readable groups.
//!
//! Every formatter has a defined fallback (raw key, "Non renseigné" or an
//! empty-state message); assembling a summary never fails. Sub-records are
//! deserialized independently so a malformed one degrades only its own
//! section.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::catalogs::{
    self, height_label, label_or_key, CHALLENGES, EYE_COLORS, HAIR_COLORS, NICKNAMES, PASSIONS,
    PET_TRAITS, SKIN_COLORS, SUPERPOWERS, TOPICS, TOY_ROLES, WORLDS,
};
use crate::models::profile::{
    AgeBracket, ChildProfile, ColorChoice, FamilyData, Gender, HairType, HeightBracket,
    NicknameChoice, Pet, PetType, PetsData, Relative, RelationType, Toy, ToysData, WorldsData,
};

const UNSPECIFIED: &str = "Non renseigné";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryItem {
    pub label: String,
    pub value: String,
}

impl SummaryItem {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummarySection {
    pub key: &'static str,
    pub title: &'static str,
    pub items: Vec<SummaryItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub sections: Vec<SummarySection>,
}

/// Resolve an embedded masculine/feminine marker (`"Curieux.se"`).
///
/// Girl: the period is removed and the suffix appended; when the suffix is
/// `se` and the base ends in `x`, the `x` is replaced (feminine of French
/// adjectives in -eux). Boy: marker and suffix stripped. Neutral: label left
/// untouched, marker included.
pub fn resolve_gendered(label: &str, gender: Gender) -> String {
    let Some((base, suffix)) = label.rsplit_once('.') else {
        return label.to_string();
    };
    let is_marker = !base.is_empty()
        && !suffix.is_empty()
        && suffix.len() <= 3
        && suffix.chars().all(|c| c.is_alphabetic());
    if !is_marker {
        return label.to_string();
    }
    match gender {
        Gender::Boy => base.to_string(),
        Gender::Girl => {
            if suffix == "se" {
                if let Some(stripped) = base.strip_suffix('x') {
                    return format!("{stripped}{suffix}");
                }
            }
            format!("{base}{suffix}")
        }
        Gender::Neutral => label.to_string(),
    }
}

/// Assemble from an in-memory profile (wizard summary step).
pub fn assemble(profile: &ChildProfile) -> ProfileSummary {
    assemble_document(&serde_json::to_value(profile).unwrap_or_default())
}

/// Assemble from a stored profile document. Scalar fields are extracted
/// leniently one by one; each nested sub-record is deserialized on its own
/// and replaced by a fallback section when unreadable.
pub fn assemble_document(doc: &Value) -> ProfileSummary {
    let gender = lenient::<Gender>(doc, "gender").unwrap_or_default();

    let sections = vec![
        basic_section(doc, gender),
        personality_section(doc, gender),
        sub_section(doc, "family", "family", "Famille", |family: FamilyData| {
            family_section(&family)
        }),
        sub_section(doc, "pets", "pets", "Animaux", |pets: PetsData| {
            pets_section(&pets)
        }),
        sub_section(doc, "toys", "toys", "Doudous et jouets", |toys: ToysData| {
            toys_section(&toys)
        }),
        sub_section(
            doc,
            "worlds",
            "worlds",
            "Univers préférés",
            |worlds: WorldsData| worlds_section(&worlds),
        ),
    ];

    ProfileSummary { sections }
}

fn lenient<T: DeserializeOwned>(doc: &Value, key: &str) -> Option<T> {
    doc.get(key)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
}

/// Containment wrapper: a sub-record that fails to deserialize yields a
/// fallback section instead of aborting the whole summary.
fn sub_section<T, F>(
    doc: &Value,
    field: &str,
    key: &'static str,
    title: &'static str,
    build: F,
) -> SummarySection
where
    T: DeserializeOwned + Default,
    F: FnOnce(T) -> SummarySection,
{
    match doc.get(field) {
        None | Some(Value::Null) => build(T::default()),
        Some(value) => match serde_json::from_value::<T>(value.clone()) {
            Ok(record) => build(record),
            Err(error) => {
                warn!(section = field, %error, "sous-section illisible, rendu de repli");
                SummarySection {
                    key,
                    title,
                    items: vec![SummaryItem::new(title, "Informations indisponibles")],
                }
            }
        },
    }
}

fn basic_section(doc: &Value, gender: Gender) -> SummarySection {
    let first_name = lenient::<String>(doc, "first_name")
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| UNSPECIFIED.to_string());

    let nickname = match lenient::<NicknameChoice>(doc, "nickname") {
        Some(NicknameChoice::Predefined { value }) => {
            label_or_key(NICKNAMES, &value).to_string()
        }
        Some(NicknameChoice::Custom { text }) if !text.trim().is_empty() => text,
        Some(NicknameChoice::Custom { .. }) => UNSPECIFIED.to_string(),
        Some(NicknameChoice::None) | None => "Aucun".to_string(),
    };

    let birth_date = lenient::<chrono::NaiveDate>(doc, "birth_date")
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| UNSPECIFIED.to_string());

    let age = lenient::<AgeBracket>(doc, "age_bracket")
        .map(|a| a.label().to_string())
        .unwrap_or_else(|| UNSPECIFIED.to_string());

    let height = lenient::<HeightBracket>(doc, "height")
        .map(|h| height_label(h, gender).to_string())
        .unwrap_or_else(|| UNSPECIFIED.to_string());

    let hair_type = lenient::<HairType>(doc, "hair_type")
        .map(|h| h.label().to_string())
        .unwrap_or_else(|| UNSPECIFIED.to_string());

    let glasses = match lenient::<bool>(doc, "glasses") {
        Some(true) => "Oui",
        Some(false) => "Non",
        None => UNSPECIFIED,
    };

    SummarySection {
        key: "basic_info",
        title: "Informations de base",
        items: vec![
            SummaryItem::new("Prénom", first_name),
            SummaryItem::new("Surnom", nickname),
            SummaryItem::new("Date de naissance", birth_date),
            SummaryItem::new("Âge", age),
            SummaryItem::new("Genre", gender.label()),
            SummaryItem::new("Peau", color_value(doc, "skin_color", SKIN_COLORS)),
            SummaryItem::new("Yeux", color_value(doc, "eye_color", EYE_COLORS)),
            SummaryItem::new("Cheveux", color_value(doc, "hair_color", HAIR_COLORS)),
            SummaryItem::new("Type de cheveux", hair_type),
            SummaryItem::new("Lunettes", glasses),
            SummaryItem::new("Taille", height),
        ],
    }
}

fn color_value(doc: &Value, field: &str, catalog: catalogs::Catalog) -> String {
    match lenient::<ColorChoice>(doc, field) {
        Some(ColorChoice::Preset { value }) => label_or_key(catalog, &value).to_string(),
        Some(ColorChoice::Custom { text }) if !text.trim().is_empty() => text,
        Some(ColorChoice::Custom { .. }) | None => UNSPECIFIED.to_string(),
    }
}

fn personality_section(doc: &Value, gender: Gender) -> SummarySection {
    let list = |field: &str, catalog: catalogs::Catalog, empty: &str| {
        let keys = lenient::<Vec<String>>(doc, field).unwrap_or_default();
        if keys.is_empty() {
            return empty.to_string();
        }
        keys.iter()
            .map(|key| resolve_gendered(label_or_key(catalog, key), gender))
            .collect::<Vec<_>>()
            .join(", ")
    };

    SummarySection {
        key: "personality",
        title: "Personnalité",
        items: vec![
            SummaryItem::new(
                "Superpouvoirs",
                list("superpowers", SUPERPOWERS, "Aucun sélectionné"),
            ),
            SummaryItem::new("Passions", list("passions", PASSIONS, "Aucune sélectionnée")),
            SummaryItem::new(
                "Petits défis",
                list("challenges", CHALLENGES, "Aucun sélectionné"),
            ),
        ],
    }
}

fn family_section(family: &FamilyData) -> SummarySection {
    let items = if family.relatives.is_empty() {
        vec![SummaryItem::new("Proches", "Aucun proche ajouté")]
    } else {
        family.relatives.iter().map(relative_item).collect()
    };
    SummarySection {
        key: "family",
        title: "Famille",
        items,
    }
}

fn relative_item(relative: &Relative) -> SummaryItem {
    // "Autre" est remplacé par le libellé saisi quand il existe.
    let label = match (&relative.relation, &relative.other_type_name) {
        (RelationType::Other, Some(name)) if !name.trim().is_empty() => name.clone(),
        (relation, _) => relation.label().to_string(),
    };

    let mut parts = Vec::new();
    if relative.first_name.trim().is_empty() {
        parts.push(UNSPECIFIED.to_string());
    } else {
        parts.push(relative.first_name.clone());
    }
    if let Some(nickname) = relative.nickname.as_deref().filter(|s| !s.trim().is_empty()) {
        parts.push(format!("« {nickname} »"));
    }
    if let Some(age) = relative.age {
        parts.push(format!("{age} ans"));
    }
    if let Some(job) = relative.job.as_deref().filter(|s| !s.trim().is_empty()) {
        parts.push(job.to_string());
    }
    if let Some(traits) = relative.traits.as_deref().filter(|s| !s.trim().is_empty()) {
        parts.push(traits.to_string());
    }

    SummaryItem::new(label, parts.join(" · "))
}

fn pets_section(pets: &PetsData) -> SummarySection {
    // Le drapeau prime sur le contenu de la liste.
    let items = if !pets.has_pets || pets.pets.is_empty() {
        vec![SummaryItem::new("Animaux", "Aucun animal ajouté")]
    } else {
        pets.pets.iter().map(pet_item).collect()
    };
    SummarySection {
        key: "pets",
        title: "Animaux",
        items,
    }
}

fn pet_item(pet: &Pet) -> SummaryItem {
    let label = match (&pet.pet_type, &pet.other_type_name) {
        (PetType::Other, Some(name)) if !name.trim().is_empty() => name.clone(),
        (pet_type, _) => pet_type.label().to_string(),
    };

    let name = if pet.name.trim().is_empty() {
        UNSPECIFIED.to_string()
    } else {
        pet.name.clone()
    };

    let traits = pet
        .traits
        .iter()
        .map(|key| {
            if key == "other" {
                match pet.custom_trait.as_deref().filter(|s| !s.trim().is_empty()) {
                    Some(custom) => custom.to_string(),
                    None => label_or_key(PET_TRAITS, key).to_string(),
                }
            } else {
                label_or_key(PET_TRAITS, key).to_string()
            }
        })
        .collect::<Vec<_>>();

    let value = if traits.is_empty() {
        name
    } else {
        format!("{name} · {}", traits.join(", "))
    };

    SummaryItem::new(label, value)
}

fn toys_section(toys: &ToysData) -> SummarySection {
    let items = if !toys.has_toys || toys.toys.is_empty() {
        vec![SummaryItem::new("Jouets", "Aucun jouet ajouté")]
    } else {
        toys.toys.iter().map(toy_item).collect()
    };
    SummarySection {
        key: "toys",
        title: "Doudous et jouets",
        items,
    }
}

fn toy_item(toy: &Toy) -> SummaryItem {
    let name = if toy.name.trim().is_empty() {
        UNSPECIFIED.to_string()
    } else {
        toy.name.clone()
    };

    let mut parts = vec![name];
    if let Some(appearance) = toy.appearance.as_deref().filter(|s| !s.trim().is_empty()) {
        parts.push(appearance.to_string());
    }
    let roles = toy
        .roles
        .iter()
        .map(|key| {
            if key == "other" {
                match toy.custom_role.as_deref().filter(|s| !s.trim().is_empty()) {
                    Some(custom) => custom.to_string(),
                    None => label_or_key(TOY_ROLES, key).to_string(),
                }
            } else {
                label_or_key(TOY_ROLES, key).to_string()
            }
        })
        .collect::<Vec<_>>();
    if !roles.is_empty() {
        parts.push(roles.join(", "));
    }

    SummaryItem::new(toy.toy_type.label(), parts.join(" · "))
}

fn worlds_section(worlds: &WorldsData) -> SummarySection {
    let collect = |keys: &[String],
                   custom_one: &Option<String>,
                   custom_two: &Option<String>,
                   catalog: catalogs::Catalog| {
        let mut labels: Vec<String> = keys
            .iter()
            .map(|key| label_or_key(catalog, key).to_string())
            .collect();
        for custom in [custom_one, custom_two] {
            if let Some(text) = custom.as_deref().filter(|s| !s.trim().is_empty()) {
                labels.push(text.to_string());
            }
        }
        labels
    };

    let favorite = collect(
        &worlds.worlds,
        &worlds.custom_world_one,
        &worlds.custom_world_two,
        WORLDS,
    );
    let topics = collect(
        &worlds.topics,
        &worlds.custom_topic_one,
        &worlds.custom_topic_two,
        TOPICS,
    );

    SummarySection {
        key: "worlds",
        title: "Univers préférés",
        items: vec![
            SummaryItem::new(
                "Univers",
                if favorite.is_empty() {
                    "Aucun univers sélectionné".to_string()
                } else {
                    favorite.join(", ")
                },
            ),
            SummaryItem::new(
                "Sujets à découvrir",
                if topics.is_empty() {
                    "Aucun sujet sélectionné".to_string()
                } else {
                    topics.join(", ")
                },
            ),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn section<'a>(summary: &'a ProfileSummary, key: &str) -> &'a SummarySection {
        summary
            .sections
            .iter()
            .find(|s| s.key == key)
            .expect("section manquante")
    }

    fn item_value<'a>(section: &'a SummarySection, label: &str) -> &'a str {
        &section
            .items
            .iter()
            .find(|i| i.label == label)
            .expect("item manquant")
            .value
    }

    #[test]
    fn gender_marker_feminine_replaces_trailing_x() {
        assert_eq!(resolve_gendered("Curieux.se", Gender::Girl), "Curieuse");
        assert_eq!(resolve_gendered("Généreux.se", Gender::Girl), "Généreuse");
    }

    #[test]
    fn gender_marker_feminine_appends_otherwise() {
        assert_eq!(resolve_gendered("Déterminé.e", Gender::Girl), "Déterminée");
        assert_eq!(resolve_gendered("Rigolo.te", Gender::Girl), "Rigolote");
        assert_eq!(resolve_gendered("Gentil.le", Gender::Girl), "Gentille");
    }

    #[test]
    fn gender_marker_masculine_strips_suffix() {
        assert_eq!(resolve_gendered("Curieux.se", Gender::Boy), "Curieux");
        assert_eq!(resolve_gendered("Déterminé.e", Gender::Boy), "Déterminé");
    }

    #[test]
    fn gender_marker_neutral_leaves_label_untouched() {
        assert_eq!(resolve_gendered("Curieux.se", Gender::Neutral), "Curieux.se");
    }

    #[test]
    fn labels_without_marker_pass_through() {
        assert_eq!(resolve_gendered("Timide", Gender::Girl), "Timide");
        // Un point suivi d'autre chose qu'un court suffixe n'est pas un marqueur.
        assert_eq!(
            resolve_gendered("Version 2.0 du héros", Gender::Girl),
            "Version 2.0 du héros"
        );
    }

    #[test]
    fn personality_resolves_markers_for_girl() {
        let mut profile = ChildProfile::default();
        profile.gender = Gender::Girl;
        profile.superpowers = vec!["curious".into()];
        let summary = assemble(&profile);
        assert_eq!(
            item_value(section(&summary, "personality"), "Superpouvoirs"),
            "Curieuse"
        );
    }

    #[test]
    fn unknown_catalog_keys_render_raw() {
        let mut profile = ChildProfile::default();
        profile.superpowers = vec!["telepathy".into()];
        profile.worlds.worlds = vec!["narnia".into()];
        let summary = assemble(&profile);
        assert_eq!(
            item_value(section(&summary, "personality"), "Superpouvoirs"),
            "telepathy"
        );
        assert_eq!(item_value(section(&summary, "worlds"), "Univers"), "narnia");
    }

    #[test]
    fn pets_flag_false_renders_empty_state() {
        let mut profile = ChildProfile::default();
        profile.pets = PetsData {
            has_pets: false,
            pets: vec![Pet {
                id: Uuid::new_v4(),
                name: "Caramel".into(),
                pet_type: PetType::Cat,
                other_type_name: None,
                traits: vec![],
                custom_trait: None,
            }],
        };
        let summary = assemble(&profile);
        assert_eq!(
            item_value(section(&summary, "pets"), "Animaux"),
            "Aucun animal ajouté"
        );
    }

    #[test]
    fn other_relative_substitutes_custom_label() {
        let mut profile = ChildProfile::default();
        profile.family.relatives = vec![Relative {
            id: Uuid::new_v4(),
            relation: RelationType::Other,
            other_type_name: Some("Marraine".into()),
            gender: Gender::Girl,
            first_name: "Louise".into(),
            nickname: None,
            age: Some(34),
            job: Some("Enseignante".into()),
            hair_color: None,
            glasses: None,
            traits: None,
        }];
        let summary = assemble(&profile);
        let family = section(&summary, "family");
        assert_eq!(family.items[0].label, "Marraine");
        assert_eq!(family.items[0].value, "Louise · 34 ans · Enseignante");
    }

    #[test]
    fn other_pet_trait_substitutes_custom_text() {
        let mut profile = ChildProfile::default();
        profile.pets = PetsData {
            has_pets: true,
            pets: vec![Pet {
                id: Uuid::new_v4(),
                name: "Réglisse".into(),
                pet_type: PetType::Dog,
                other_type_name: None,
                traits: vec!["playful".into(), "other".into()],
                custom_trait: Some("Ronfleur".into()),
            }],
        };
        let summary = assemble(&profile);
        assert_eq!(
            item_value(section(&summary, "pets"), "Chien"),
            "Réglisse · Joueur, Ronfleur"
        );
    }

    #[test]
    fn custom_color_renders_verbatim_and_empty_custom_falls_back() {
        let mut profile = ChildProfile::default();
        profile.eye_color = Some(ColorChoice::Custom {
            text: "Vert d'eau".into(),
        });
        profile.hair_color = Some(ColorChoice::Custom { text: "  ".into() });
        let summary = assemble(&profile);
        let basic = section(&summary, "basic_info");
        assert_eq!(item_value(basic, "Yeux"), "Vert d'eau");
        assert_eq!(item_value(basic, "Cheveux"), UNSPECIFIED);
    }

    #[test]
    fn height_follows_profile_gender() {
        let mut profile = ChildProfile::default();
        profile.gender = Gender::Girl;
        profile.height = Some(HeightBracket::Tall);
        let summary = assemble(&profile);
        assert_eq!(item_value(section(&summary, "basic_info"), "Taille"), "Grande");
    }

    #[test]
    fn malformed_sub_record_degrades_only_its_section() {
        let doc = json!({
            "first_name": "Léa",
            "gender": "girl",
            // family est illisible : relatives devrait être un tableau
            "family": { "relatives": "oops" },
            "toys": { "has_toys": true, "toys": [] },
        });
        let summary = assemble_document(&doc);
        let family = section(&summary, "family");
        assert_eq!(family.items[0].value, "Informations indisponibles");
        // Les autres sections continuent de rendre normalement.
        assert_eq!(item_value(section(&summary, "basic_info"), "Prénom"), "Léa");
        assert_eq!(
            item_value(section(&summary, "toys"), "Jouets"),
            "Aucun jouet ajouté"
        );
    }

    #[test]
    fn empty_document_renders_full_fallback_summary() {
        let summary = assemble_document(&json!({}));
        assert_eq!(summary.sections.len(), 6);
        let basic = section(&summary, "basic_info");
        assert_eq!(item_value(basic, "Prénom"), UNSPECIFIED);
        assert_eq!(item_value(basic, "Genre"), "Non précisé");
    }
}
