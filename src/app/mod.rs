//! In-memory application state: flashcards, study sessions, quests,
//! marketplace, and leaderboard.
//!
//! All of it is session-scoped seed data with no persistence. State is
//! owned by a single [`AppState`] and mutated only through the operations
//! here; the presentation layer gets read-only views.

mod seed;

use crate::error::{Result, TutorError};
use serde::{Deserialize, Serialize};

/// XP required to clear a level.
const LEVEL_XP_STEP: u32 = 500;

/// XP for answering a study card correctly / incorrectly.
const XP_CORRECT: u32 = 10;
const XP_INCORRECT: u32 = 5;

/// Flashcard difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One flashcard in the user's collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub id: u32,
    pub front: String,
    pub back: String,
    pub subject: String,
    pub difficulty: Difficulty,
    pub mastered: bool,
}

/// The user's progression stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub level: u32,
    pub xp: u32,
    pub xp_to_next: u32,
    pub streak: u32,
    pub total_cards: u32,
    pub mastered_cards: u32,
    pub gems: u32,
    pub coins: u32,
}

/// Quest cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestKind {
    Daily,
    Weekly,
}

/// A progress-tracked challenge with an XP reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub reward: u32,
    pub completed: bool,
    pub kind: QuestKind,
    pub progress: u32,
    pub target: u32,
}

/// Marketplace card rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

/// A card offered by another learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceListing {
    pub id: u32,
    pub card_id: u32,
    pub seller: String,
    pub price: u32,
    pub rarity: Rarity,
    pub front: String,
    pub back: String,
    pub subject: String,
    pub difficulty: Difficulty,
}

/// One row of the global leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub name: String,
    pub xp: u32,
    pub level: u32,
    pub streak: u32,
}

/// Navigable screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dashboard,
    Study,
    Collection,
    Marketplace,
    Quests,
    Leaderboard,
    Chat,
}

/// Progress through an active study session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudySession {
    pub card_index: usize,
    pub show_answer: bool,
}

/// The whole mock application state.
pub struct AppState {
    section: Section,
    stats: UserStats,
    cards: Vec<Flashcard>,
    quests: Vec<Quest>,
    listings: Vec<MarketplaceListing>,
    leaderboard: Vec<LeaderboardEntry>,
    study: Option<StudySession>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            section: Section::Dashboard,
            stats: seed::initial_stats(),
            cards: seed::cards(),
            quests: seed::quests(),
            listings: seed::listings(),
            leaderboard: seed::leaderboard(),
            study: None,
        }
    }
}

impl AppState {
    /// Create state populated with the demo seed data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ── Read-only views ────────────────────────────────────────────────

    #[must_use]
    pub fn section(&self) -> Section {
        self.section
    }

    #[must_use]
    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    #[must_use]
    pub fn cards(&self) -> &[Flashcard] {
        &self.cards
    }

    #[must_use]
    pub fn quests(&self) -> &[Quest] {
        &self.quests
    }

    #[must_use]
    pub fn listings(&self) -> &[MarketplaceListing] {
        &self.listings
    }

    #[must_use]
    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    #[must_use]
    pub fn study(&self) -> Option<&StudySession> {
        self.study.as_ref()
    }

    /// The card currently shown in the study session, if one is active.
    #[must_use]
    pub fn current_card(&self) -> Option<&Flashcard> {
        self.study.and_then(|s| self.cards.get(s.card_index))
    }

    /// Mastered-card share as a whole percentage.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        if self.stats.total_cards == 0 {
            0
        } else {
            self.stats.mastered_cards * 100 / self.stats.total_cards
        }
    }

    // ── Operations ─────────────────────────────────────────────────────

    /// Switch the visible screen.
    pub fn show_section(&mut self, section: Section) {
        self.section = section;
    }

    /// Begin a study session at the first card.
    ///
    /// # Errors
    ///
    /// Fails when the collection is empty.
    pub fn start_study_session(&mut self) -> Result<()> {
        if self.cards.is_empty() {
            return Err(TutorError::App("no cards to study".to_owned()));
        }
        self.study = Some(StudySession {
            card_index: 0,
            show_answer: false,
        });
        Ok(())
    }

    /// End the study session.
    pub fn end_study_session(&mut self) {
        self.study = None;
    }

    /// Reveal the answer side of the current card.
    pub fn reveal_answer(&mut self) {
        if let Some(study) = &mut self.study {
            study.show_answer = true;
        }
    }

    /// Advance to the next card, stopping at the last.
    pub fn next_card(&mut self) {
        let last = self.cards.len().saturating_sub(1);
        if let Some(study) = &mut self.study
            && study.card_index < last
        {
            study.card_index += 1;
            study.show_answer = false;
        }
    }

    /// Step back to the previous card, stopping at the first.
    pub fn prev_card(&mut self) {
        if let Some(study) = &mut self.study
            && study.card_index > 0
        {
            study.card_index -= 1;
            study.show_answer = false;
        }
    }

    /// Grade the current card and advance.
    ///
    /// A correct answer is worth 10 XP and masters the card; an incorrect
    /// answer still earns 5 XP for the attempt.
    ///
    /// # Errors
    ///
    /// Fails when no study session is active.
    pub fn mark_card(&mut self, correct: bool) -> Result<()> {
        let Some(study) = self.study else {
            return Err(TutorError::App("no active study session".to_owned()));
        };
        let Some(card) = self.cards.get_mut(study.card_index) else {
            return Err(TutorError::App("study index out of range".to_owned()));
        };

        if correct && !card.mastered {
            card.mastered = true;
            self.stats.mastered_cards += 1;
        }
        self.award_xp(if correct { XP_CORRECT } else { XP_INCORRECT });
        self.next_card();
        Ok(())
    }

    /// Add a new card to the collection.
    ///
    /// # Errors
    ///
    /// Fails when front, back, or subject is blank.
    pub fn add_card(
        &mut self,
        front: &str,
        back: &str,
        subject: &str,
        difficulty: Difficulty,
    ) -> Result<u32> {
        if front.trim().is_empty() || back.trim().is_empty() || subject.trim().is_empty() {
            return Err(TutorError::App(
                "front, back, and subject are all required".to_owned(),
            ));
        }
        let id = self.next_card_id();
        self.cards.push(Flashcard {
            id,
            front: front.trim().to_owned(),
            back: back.trim().to_owned(),
            subject: subject.trim().to_owned(),
            difficulty,
            mastered: false,
        });
        self.stats.total_cards += 1;
        Ok(id)
    }

    /// Buy a marketplace listing, copying its card into the collection.
    ///
    /// # Errors
    ///
    /// Fails when the listing does not exist or coins are insufficient.
    pub fn purchase(&mut self, listing_id: u32) -> Result<()> {
        let Some(pos) = self.listings.iter().position(|l| l.id == listing_id) else {
            return Err(TutorError::App(format!("no such listing: {listing_id}")));
        };
        if self.stats.coins < self.listings[pos].price {
            return Err(TutorError::App("not enough coins".to_owned()));
        }

        let listing = self.listings.remove(pos);
        self.stats.coins -= listing.price;
        let id = self.next_card_id();
        self.cards.push(Flashcard {
            id,
            front: listing.front,
            back: listing.back,
            subject: listing.subject,
            difficulty: listing.difficulty,
            mastered: false,
        });
        self.stats.total_cards += 1;
        Ok(())
    }

    fn next_card_id(&self) -> u32 {
        self.cards.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    fn award_xp(&mut self, gain: u32) {
        self.stats.xp += gain;
        if gain >= self.stats.xp_to_next {
            let overshoot = gain - self.stats.xp_to_next;
            self.stats.level += 1;
            self.stats.xp_to_next = LEVEL_XP_STEP.saturating_sub(overshoot).max(1);
        } else {
            self.stats.xp_to_next -= gain;
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn seed_data_matches_the_demo_inventory() {
        let state = AppState::new();
        assert_eq!(state.cards().len(), 5);
        assert_eq!(state.quests().len(), 4);
        assert_eq!(state.listings().len(), 4);
        assert_eq!(state.leaderboard().len(), 5);
        assert_eq!(state.stats().coins, 250);
        assert_eq!(state.stats().gems, 35);
    }

    #[test]
    fn marking_correct_awards_xp_and_masters_the_card() {
        let mut state = AppState::new();
        state.start_study_session().unwrap();

        // Seed card 3 (index 2) is unmastered.
        state.next_card();
        state.next_card();
        let before = state.stats().clone();
        state.mark_card(true).unwrap();

        assert_eq!(state.stats().xp, before.xp + 10);
        assert_eq!(state.stats().xp_to_next, before.xp_to_next - 10);
        assert_eq!(state.stats().mastered_cards, before.mastered_cards + 1);
        assert!(state.cards()[2].mastered);
    }

    #[test]
    fn marking_incorrect_still_awards_attempt_xp() {
        let mut state = AppState::new();
        state.start_study_session().unwrap();
        let before = state.stats().clone();
        state.mark_card(false).unwrap();

        assert_eq!(state.stats().xp, before.xp + 5);
        assert_eq!(state.stats().mastered_cards, before.mastered_cards);
    }

    #[test]
    fn remastering_a_card_does_not_double_count() {
        let mut state = AppState::new();
        state.start_study_session().unwrap();
        // Seed card 1 is already mastered.
        let before = state.stats().mastered_cards;
        state.mark_card(true).unwrap();
        assert_eq!(state.stats().mastered_cards, before);
    }

    #[test]
    fn crossing_the_xp_threshold_levels_up() {
        let mut state = AppState::new();
        state.stats.xp_to_next = 8;
        state.start_study_session().unwrap();
        state.mark_card(true).unwrap();

        assert_eq!(state.stats().level, 2);
        assert_eq!(state.stats().xp_to_next, LEVEL_XP_STEP - 2);
    }

    #[test]
    fn mark_without_session_is_rejected() {
        let mut state = AppState::new();
        assert!(state.mark_card(true).is_err());
    }

    #[test]
    fn study_navigation_is_bounded() {
        let mut state = AppState::new();
        state.start_study_session().unwrap();

        state.prev_card();
        assert_eq!(state.study().unwrap().card_index, 0);

        for _ in 0..10 {
            state.next_card();
        }
        assert_eq!(state.study().unwrap().card_index, 4);
    }

    #[test]
    fn reveal_resets_when_moving_between_cards() {
        let mut state = AppState::new();
        state.start_study_session().unwrap();
        state.reveal_answer();
        assert!(state.study().unwrap().show_answer);
        state.next_card();
        assert!(!state.study().unwrap().show_answer);
    }

    #[test]
    fn add_card_validates_and_assigns_the_next_id() {
        let mut state = AppState::new();
        assert!(state.add_card(" ", "back", "Math", Difficulty::Easy).is_err());
        assert_eq!(state.cards().len(), 5);

        let id = state
            .add_card("What is 2+2?", "4", "Math", Difficulty::Easy)
            .unwrap();
        assert_eq!(id, 6);
        assert_eq!(state.cards().len(), 6);
        assert_eq!(state.stats().total_cards, 13);
    }

    #[test]
    fn purchase_requires_enough_coins() {
        let mut state = AppState::new();
        // Legendary listing costs 100; drain coins below that.
        state.stats.coins = 50;
        let legendary = state
            .listings()
            .iter()
            .find(|l| l.rarity == Rarity::Legendary)
            .unwrap()
            .id;
        assert!(state.purchase(legendary).is_err());
        assert_eq!(state.listings().len(), 4);
    }

    #[test]
    fn purchase_debits_coins_and_copies_the_card() {
        let mut state = AppState::new();
        let listing = state.listings()[1].clone();
        state.purchase(listing.id).unwrap();

        assert_eq!(state.stats().coins, 250 - listing.price);
        assert_eq!(state.listings().len(), 3);
        assert_eq!(state.cards().last().unwrap().front, listing.front);
        assert!(!state.cards().last().unwrap().mastered);
        assert_eq!(state.stats().total_cards, 13);
    }

    #[test]
    fn accuracy_is_a_whole_percentage() {
        let state = AppState::new();
        // Seed stats: 8 of 12 mastered.
        assert_eq!(state.accuracy_percent(), 66);
    }
}
