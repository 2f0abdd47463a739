//! Multi-step profile wizard — step sequencing, mode-dependent skipping,
//! field setters and submit validation. Pure state, no I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::profile::{
    AgeBracket, ChildProfile, ColorChoice, Gender, HairType, HeightBracket, NicknameChoice,
    PetsData, Relative, RelationType, PetType, ToysData, WorldsData,
};

/// Highest raw step index, identical in both modes (edit mode skips
/// indices 2 and 3 but keeps the raw numbering).
pub const MAX_STEP: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardMode {
    /// 7 steps: basic info, personality, family, pets, toys, worlds, summary.
    Full,
    /// 5 steps: family and pets are skipped entirely, not merely hidden.
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    BasicInfo,
    Personality,
    Family,
    Pets,
    Toys,
    Worlds,
    Summary,
}

impl WizardStep {
    /// Pure renderer contract: `(index, mode)` to exactly one step, or `None`
    /// for an out-of-range index or a step the mode disables. Callers render
    /// nothing on `None` rather than failing.
    pub fn for_index(index: usize, mode: WizardMode) -> Option<WizardStep> {
        if !step_allowed(index, mode) {
            return None;
        }
        Some(match index {
            0 => WizardStep::BasicInfo,
            1 => WizardStep::Personality,
            2 => WizardStep::Family,
            3 => WizardStep::Pets,
            4 => WizardStep::Toys,
            5 => WizardStep::Worlds,
            _ => WizardStep::Summary,
        })
    }

    pub fn index(&self) -> usize {
        match self {
            WizardStep::BasicInfo => 0,
            WizardStep::Personality => 1,
            WizardStep::Family => 2,
            WizardStep::Pets => 3,
            WizardStep::Toys => 4,
            WizardStep::Worlds => 5,
            WizardStep::Summary => 6,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::BasicInfo => "Informations de base",
            WizardStep::Personality => "Personnalité",
            WizardStep::Family => "Famille",
            WizardStep::Pets => "Animaux",
            WizardStep::Toys => "Doudous et jouets",
            WizardStep::Worlds => "Univers préférés",
            WizardStep::Summary => "Récapitulatif",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WizardStep::BasicInfo => "basic_info",
            WizardStep::Personality => "personality",
            WizardStep::Family => "family",
            WizardStep::Pets => "pets",
            WizardStep::Toys => "toys",
            WizardStep::Worlds => "worlds",
            WizardStep::Summary => "summary",
        };
        write!(f, "{s}")
    }
}

pub fn step_allowed(index: usize, mode: WizardMode) -> bool {
    match mode {
        WizardMode::Full => index <= MAX_STEP,
        WizardMode::Edit => index <= MAX_STEP && index != 2 && index != 3,
    }
}

/// Progress display index: edit mode shows 5 steps, so the raw index is
/// shifted back by the two skipped steps once past personality.
pub fn visible_index(raw: usize, mode: WizardMode) -> usize {
    match mode {
        WizardMode::Edit if raw > 1 => raw - 2,
        _ => raw,
    }
}

pub fn visible_step_count(mode: WizardMode) -> usize {
    match mode {
        WizardMode::Full => 7,
        WizardMode::Edit => 5,
    }
}

/// One setter per top-level field or sub-record; each replaces its slice of
/// the profile wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum FieldUpdate {
    FirstName { value: String },
    Nickname { value: NicknameChoice },
    BirthDate { value: Option<NaiveDate> },
    AgeBracket { value: AgeBracket },
    Gender { value: Gender },
    SkinColor { value: Option<ColorChoice> },
    EyeColor { value: Option<ColorChoice> },
    HairColor { value: Option<ColorChoice> },
    HairType { value: Option<HairType> },
    Glasses { value: bool },
    Height { value: Option<HeightBracket> },
    Superpowers { values: Vec<String> },
    Passions { values: Vec<String> },
    Challenges { values: Vec<String> },
    Family { relatives: Vec<Relative> },
    Pets { value: PetsData },
    Toys { value: ToysData },
    Worlds { value: WorldsData },
}

/// A submit-blocking gap. Navigation is never blocked by these; only the
/// final submission is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "gap", rename_all = "snake_case")]
pub enum WizardGap {
    MissingFirstName,
    EmptyCustomText { field: String },
    StepNotVisited { step: WizardStep },
}

impl std::fmt::Display for WizardGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WizardGap::MissingFirstName => write!(f, "Le prénom est requis"),
            WizardGap::EmptyCustomText { field } => {
                write!(f, "Texte personnalisé manquant : {field}")
            }
            WizardGap::StepNotVisited { step } => {
                write!(f, "Étape non complétée : {}", step.title())
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("identifiants dupliqués dans la liste {list}")]
    DuplicateIds { list: &'static str },
    #[error("le profil est incomplet")]
    Incomplete { gaps: Vec<WizardGap> },
}

/// The whole in-progress flow: current raw step, visited set and the
/// accumulated profile. Serialized as-is into the draft store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardState {
    pub mode: WizardMode,
    pub step: usize,
    /// Raw indices already presented to the user.
    pub visited: Vec<usize>,
    pub profile: ChildProfile,
    /// Persisted record being edited, set in edit mode.
    pub child_id: Option<Uuid>,
}

impl WizardState {
    pub fn new(mode: WizardMode) -> Self {
        Self {
            mode,
            step: 0,
            visited: vec![0],
            profile: ChildProfile::default(),
            child_id: None,
        }
    }

    /// Edit mode: pre-populated from a persisted record.
    pub fn for_edit(child_id: Uuid, profile: ChildProfile) -> Self {
        Self {
            mode: WizardMode::Edit,
            step: 0,
            visited: vec![0],
            profile,
            child_id: Some(child_id),
        }
    }

    pub fn current_step(&self) -> Option<WizardStep> {
        WizardStep::for_index(self.step, self.mode)
    }

    fn mark_visited(&mut self) {
        if !self.visited.contains(&self.step) {
            self.visited.push(self.step);
        }
    }

    /// Advance to the next step allowed by the mode; no-op at the last step.
    pub fn go_next(&mut self) {
        let mut next = self.step + 1;
        while next <= MAX_STEP && !step_allowed(next, self.mode) {
            next += 1;
        }
        if next <= MAX_STEP {
            self.step = next;
            self.mark_visited();
        }
    }

    /// Step back to the previous allowed step; no-op at the first step.
    pub fn go_previous(&mut self) {
        let mut prev = self.step;
        while prev > 0 {
            prev -= 1;
            if step_allowed(prev, self.mode) {
                self.step = prev;
                self.mark_visited();
                return;
            }
        }
    }

    /// Jump directly to a step, clamped into `[0, MAX_STEP]`. A clamped
    /// target the mode disables is a no-op: the controller never presents a
    /// step outside the mode's allowed set.
    pub fn go_to_step(&mut self, target: usize) {
        let clamped = target.min(MAX_STEP);
        if step_allowed(clamped, self.mode) {
            self.step = clamped;
            self.mark_visited();
        }
    }

    /// Apply one field setter. List updates are rejected when item ids
    /// collide — ids are list keys and update/delete targets, so they must
    /// stay unique and stable.
    pub fn apply(&mut self, update: FieldUpdate) -> Result<(), WizardError> {
        match update {
            FieldUpdate::FirstName { value } => self.profile.first_name = value,
            FieldUpdate::Nickname { value } => self.profile.nickname = value,
            FieldUpdate::BirthDate { value } => self.profile.birth_date = value,
            FieldUpdate::AgeBracket { value } => self.profile.age_bracket = value,
            FieldUpdate::Gender { value } => self.profile.gender = value,
            FieldUpdate::SkinColor { value } => self.profile.skin_color = value,
            FieldUpdate::EyeColor { value } => self.profile.eye_color = value,
            FieldUpdate::HairColor { value } => self.profile.hair_color = value,
            FieldUpdate::HairType { value } => self.profile.hair_type = value,
            FieldUpdate::Glasses { value } => self.profile.glasses = value,
            FieldUpdate::Height { value } => self.profile.height = value,
            FieldUpdate::Superpowers { values } => self.profile.superpowers = values,
            FieldUpdate::Passions { values } => self.profile.passions = values,
            FieldUpdate::Challenges { values } => self.profile.challenges = values,
            FieldUpdate::Family { relatives } => {
                ensure_unique_ids(relatives.iter().map(|r| r.id), "family.relatives")?;
                self.profile.family.relatives = relatives;
            }
            FieldUpdate::Pets { value } => {
                ensure_unique_ids(value.pets.iter().map(|p| p.id), "pets.pets")?;
                self.profile.pets = value;
            }
            FieldUpdate::Toys { value } => {
                ensure_unique_ids(value.toys.iter().map(|t| t.id), "toys.toys")?;
                self.profile.toys = value;
            }
            FieldUpdate::Worlds { value } => self.profile.worlds = value,
        }
        Ok(())
    }

    /// Check that every step required by the mode has been visited and that
    /// required fields / custom-text invariants hold.
    pub fn validate_for_submit(&self) -> Result<(), WizardError> {
        let mut gaps = Vec::new();

        if self.profile.first_name.trim().is_empty() {
            gaps.push(WizardGap::MissingFirstName);
        }

        if let NicknameChoice::Custom { text } = &self.profile.nickname {
            if text.trim().is_empty() {
                gaps.push(WizardGap::EmptyCustomText {
                    field: "nickname".into(),
                });
            }
        }
        for (field, choice) in [
            ("skin_color", &self.profile.skin_color),
            ("eye_color", &self.profile.eye_color),
            ("hair_color", &self.profile.hair_color),
        ] {
            if let Some(ColorChoice::Custom { text }) = choice {
                if text.trim().is_empty() {
                    gaps.push(WizardGap::EmptyCustomText {
                        field: field.into(),
                    });
                }
            }
        }
        for relative in &self.profile.family.relatives {
            if relative.relation == RelationType::Other
                && relative
                    .other_type_name
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or("")
                    .is_empty()
            {
                gaps.push(WizardGap::EmptyCustomText {
                    field: format!("family.relatives.{}.other_type_name", relative.id),
                });
            }
        }
        for pet in &self.profile.pets.pets {
            if pet.pet_type == PetType::Other
                && pet
                    .other_type_name
                    .as_deref()
                    .map(str::trim)
                    .unwrap_or("")
                    .is_empty()
            {
                gaps.push(WizardGap::EmptyCustomText {
                    field: format!("pets.pets.{}.other_type_name", pet.id),
                });
            }
        }

        for index in 0..MAX_STEP {
            if step_allowed(index, self.mode) && !self.visited.contains(&index) {
                if let Some(step) = WizardStep::for_index(index, self.mode) {
                    gaps.push(WizardGap::StepNotVisited { step });
                }
            }
        }

        if gaps.is_empty() {
            Ok(())
        } else {
            Err(WizardError::Incomplete { gaps })
        }
    }
}

fn ensure_unique_ids(
    ids: impl Iterator<Item = Uuid>,
    list: &'static str,
) -> Result<(), WizardError> {
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(WizardError::DuplicateIds { list });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::Pet;

    fn visit_all(state: &mut WizardState) {
        while state.current_step() != Some(WizardStep::Summary) {
            state.go_next();
        }
    }

    fn complete_profile(state: &mut WizardState) {
        state
            .apply(FieldUpdate::FirstName {
                value: "Léa".into(),
            })
            .unwrap();
        visit_all(state);
    }

    #[test]
    fn full_mode_walks_all_seven_steps() {
        let mut state = WizardState::new(WizardMode::Full);
        let expected = [
            WizardStep::BasicInfo,
            WizardStep::Personality,
            WizardStep::Family,
            WizardStep::Pets,
            WizardStep::Toys,
            WizardStep::Worlds,
            WizardStep::Summary,
        ];
        for step in expected {
            assert_eq!(state.current_step(), Some(step));
            state.go_next();
        }
        // Dernière étape : go_next ne bouge plus.
        assert_eq!(state.current_step(), Some(WizardStep::Summary));
    }

    #[test]
    fn edit_mode_skips_family_and_pets() {
        let mut state = WizardState::new(WizardMode::Edit);
        let expected = [
            WizardStep::BasicInfo,
            WizardStep::Personality,
            WizardStep::Toys,
            WizardStep::Worlds,
            WizardStep::Summary,
        ];
        for step in expected {
            assert_eq!(state.current_step(), Some(step));
            state.go_next();
        }
        assert_eq!(state.step, 6);
    }

    #[test]
    fn go_previous_hops_over_skipped_steps() {
        let mut state = WizardState::new(WizardMode::Edit);
        state.go_next(); // personality (1)
        state.go_next(); // toys (4)
        assert_eq!(state.step, 4);
        state.go_previous();
        assert_eq!(state.step, 1);
        state.go_previous();
        assert_eq!(state.step, 0);
        state.go_previous(); // no-op at first step
        assert_eq!(state.step, 0);
    }

    #[test]
    fn next_then_previous_returns_to_origin() {
        for mode in [WizardMode::Full, WizardMode::Edit] {
            for start in 0..MAX_STEP {
                if !step_allowed(start, mode) {
                    continue;
                }
                let mut state = WizardState::new(mode);
                state.go_to_step(start);
                let before = state.step;
                state.go_next();
                if state.step != before {
                    state.go_previous();
                    assert_eq!(state.step, before, "mode {mode:?}, start {start}");
                }
            }
        }
    }

    #[test]
    fn go_to_step_clamps_into_range() {
        let mut state = WizardState::new(WizardMode::Full);
        state.go_to_step(99);
        assert_eq!(state.step, MAX_STEP);
        state.go_to_step(0);
        assert_eq!(state.step, 0);
    }

    #[test]
    fn go_to_disabled_step_is_a_noop() {
        let mut state = WizardState::new(WizardMode::Edit);
        state.go_next();
        assert_eq!(state.step, 1);
        state.go_to_step(2); // family — désactivée en mode édition
        assert_eq!(state.step, 1);
        state.go_to_step(3); // pets
        assert_eq!(state.step, 1);
        assert_eq!(WizardStep::for_index(2, WizardMode::Edit), None);
        assert_eq!(WizardStep::for_index(3, WizardMode::Edit), None);
    }

    #[test]
    fn navigation_never_lands_on_excluded_step() {
        for mode in [WizardMode::Full, WizardMode::Edit] {
            for target in 0..20 {
                let mut state = WizardState::new(mode);
                state.go_to_step(target);
                assert!(step_allowed(state.step, mode));
                assert!(state.current_step().is_some());
            }
        }
    }

    #[test]
    fn renderer_yields_none_out_of_range() {
        assert_eq!(WizardStep::for_index(7, WizardMode::Full), None);
        assert_eq!(WizardStep::for_index(42, WizardMode::Edit), None);
        assert_eq!(
            WizardStep::for_index(6, WizardMode::Edit),
            Some(WizardStep::Summary)
        );
    }

    #[test]
    fn visible_index_offsets_edit_mode_past_personality() {
        assert_eq!(visible_index(0, WizardMode::Edit), 0);
        assert_eq!(visible_index(1, WizardMode::Edit), 1);
        assert_eq!(visible_index(4, WizardMode::Edit), 2);
        assert_eq!(visible_index(5, WizardMode::Edit), 3);
        assert_eq!(visible_index(6, WizardMode::Edit), 4);
        for raw in 0..=MAX_STEP {
            assert_eq!(visible_index(raw, WizardMode::Full), raw);
        }
    }

    #[test]
    fn duplicate_list_ids_are_rejected() {
        let mut state = WizardState::new(WizardMode::Full);
        let id = Uuid::new_v4();
        let pet = |name: &str| Pet {
            id,
            name: name.into(),
            pet_type: crate::models::profile::PetType::Cat,
            other_type_name: None,
            traits: vec![],
            custom_trait: None,
        };
        let result = state.apply(FieldUpdate::Pets {
            value: PetsData {
                has_pets: true,
                pets: vec![pet("Caramel"), pet("Réglisse")],
            },
        });
        assert!(matches!(
            result,
            Err(WizardError::DuplicateIds { list: "pets.pets" })
        ));
        // L'état n'a pas été modifié.
        assert!(state.profile.pets.pets.is_empty());
    }

    #[test]
    fn submit_requires_first_name_and_visited_steps() {
        let state = WizardState::new(WizardMode::Full);
        let Err(WizardError::Incomplete { gaps }) = state.validate_for_submit() else {
            panic!("expected incomplete profile");
        };
        assert!(gaps.contains(&WizardGap::MissingFirstName));
        assert!(gaps.contains(&WizardGap::StepNotVisited {
            step: WizardStep::Personality
        }));
        // Les étapes sautées en mode édition ne sont jamais exigées.
        let edit = WizardState::new(WizardMode::Edit);
        let Err(WizardError::Incomplete { gaps }) = edit.validate_for_submit() else {
            panic!("expected incomplete profile");
        };
        assert!(!gaps
            .iter()
            .any(|g| matches!(g, WizardGap::StepNotVisited { step: WizardStep::Family })));
    }

    #[test]
    fn submit_flags_empty_custom_text() {
        let mut state = WizardState::new(WizardMode::Full);
        complete_profile(&mut state);
        state
            .apply(FieldUpdate::Nickname {
                value: NicknameChoice::Custom { text: "  ".into() },
            })
            .unwrap();
        let Err(WizardError::Incomplete { gaps }) = state.validate_for_submit() else {
            panic!("expected incomplete profile");
        };
        assert_eq!(
            gaps,
            vec![WizardGap::EmptyCustomText {
                field: "nickname".into()
            }]
        );
    }

    #[test]
    fn submit_passes_on_complete_profile() {
        let mut state = WizardState::new(WizardMode::Full);
        complete_profile(&mut state);
        assert!(state.validate_for_submit().is_ok());

        let mut edit = WizardState::for_edit(Uuid::new_v4(), state.profile.clone());
        visit_all(&mut edit);
        assert!(edit.validate_for_submit().is_ok());
    }
}
