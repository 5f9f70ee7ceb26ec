//! Demo seed data for the in-memory state.

use super::{
    Difficulty, Flashcard, LeaderboardEntry, MarketplaceListing, Quest, QuestKind, Rarity,
    UserStats,
};

pub(super) fn initial_stats() -> UserStats {
    UserStats {
        level: 1,
        xp: 350,
        xp_to_next: 150,
        streak: 5,
        total_cards: 12,
        mastered_cards: 8,
        gems: 35,
        coins: 250,
    }
}

pub(super) fn cards() -> Vec<Flashcard> {
    let rows = [
        (
            1,
            "What is photosynthesis?",
            "The process by which plants convert sunlight into energy",
            "Biology",
            Difficulty::Easy,
            true,
        ),
        (
            2,
            "What is the capital of France?",
            "Paris",
            "Geography",
            Difficulty::Easy,
            true,
        ),
        (3, "What is 15 × 7?", "105", "Math", Difficulty::Medium, false),
        (
            4,
            "Who wrote Romeo and Juliet?",
            "William Shakespeare",
            "Literature",
            Difficulty::Medium,
            false,
        ),
        (
            5,
            "What is the chemical symbol for gold?",
            "Au",
            "Chemistry",
            Difficulty::Hard,
            false,
        ),
    ];
    rows.into_iter()
        .map(|(id, front, back, subject, difficulty, mastered)| Flashcard {
            id,
            front: front.to_owned(),
            back: back.to_owned(),
            subject: subject.to_owned(),
            difficulty,
            mastered,
        })
        .collect()
}

pub(super) fn quests() -> Vec<Quest> {
    let rows = [
        (
            1,
            "Study Master",
            "Study 20 cards today",
            50,
            false,
            QuestKind::Daily,
            15,
            20,
        ),
        (
            2,
            "Streak Keeper",
            "Maintain a 7-day streak",
            100,
            false,
            QuestKind::Weekly,
            5,
            7,
        ),
        (
            3,
            "Collection Builder",
            "Create 5 new cards",
            25,
            true,
            QuestKind::Daily,
            5,
            5,
        ),
        (
            4,
            "Knowledge Seeker",
            "Master 10 cards",
            75,
            false,
            QuestKind::Weekly,
            8,
            10,
        ),
    ];
    rows.into_iter()
        .map(
            |(id, title, description, reward, completed, kind, progress, target)| Quest {
                id,
                title: title.to_owned(),
                description: description.to_owned(),
                reward,
                completed,
                kind,
                progress,
                target,
            },
        )
        .collect()
}

pub(super) fn listings() -> Vec<MarketplaceListing> {
    let rows = [
        (
            1,
            10,
            "StudyMaster99",
            50,
            Rarity::Rare,
            "What is quantum entanglement?",
            "A quantum mechanical phenomenon where particles remain correlated",
            "Physics",
            Difficulty::Hard,
        ),
        (
            2,
            11,
            "BrainBox42",
            25,
            Rarity::Common,
            "Capital of Japan?",
            "Tokyo",
            "Geography",
            Difficulty::Easy,
        ),
        (
            3,
            12,
            "CardCollector",
            100,
            Rarity::Legendary,
            "Prove Fermat's Last Theorem",
            "Andrew Wiles' proof (1995) via modular elliptic curves",
            "Mathematics",
            Difficulty::Hard,
        ),
        (
            4,
            13,
            "LanguageLover",
            30,
            Rarity::Uncommon,
            "¿Cómo estás?",
            "How are you? (Spanish)",
            "Spanish",
            Difficulty::Medium,
        ),
    ];
    rows.into_iter()
        .map(
            |(id, card_id, seller, price, rarity, front, back, subject, difficulty)| {
                MarketplaceListing {
                    id,
                    card_id,
                    seller: seller.to_owned(),
                    price,
                    rarity,
                    front: front.to_owned(),
                    back: back.to_owned(),
                    subject: subject.to_owned(),
                    difficulty,
                }
            },
        )
        .collect()
}

pub(super) fn leaderboard() -> Vec<LeaderboardEntry> {
    let rows = [
        (1, "StudyNinja", 2847, 15, 23),
        (2, "BrainMaster", 2634, 14, 18),
        (3, "CardWizard", 2401, 13, 31),
        (4, "You", 350, 1, 5),
        (5, "QuizKing", 298, 1, 3),
    ];
    rows.into_iter()
        .map(|(rank, name, xp, level, streak)| LeaderboardEntry {
            rank,
            name: name.to_owned(),
            xp,
            level,
            streak,
        })
        .collect()
}
