// Deck session: the ordered working set of cards for one study pass.
//
// A session owns the authoritative word list fetched from the backend (the
// source) and a derived deck built from it by filtering and ordering.
// The deck is rebuilt only when its policy changes or when the source gains
// or loses words; plain field updates (progress responses, edits) are
// patched into both lists in place so the cursor keeps pointing at the same
// slot. The same type backs the Cards tab and the Review tab; they differ
// only in their DeckSource.

use std::fmt;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};

use crate::api::{ApiError, DeckSource, ProgressBackend};
use crate::model::{CardDirection, CardOrder, NotebookSettings, ProgressUpdate, Word, WordId};

pub const DEFAULT_ADVANCE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeckPolicy {
    pub exclude_mastered: bool,
    pub order: CardOrder,
}

/// What the learner said about the card in front of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgment {
    Correct,
    Wrong,
    Master,
    Unmaster,
}

impl Judgment {
    pub fn update(self) -> ProgressUpdate {
        match self {
            Judgment::Correct => ProgressUpdate {
                correct: true,
                mastered: None,
            },
            Judgment::Wrong => ProgressUpdate {
                correct: false,
                mastered: None,
            },
            Judgment::Master => ProgressUpdate {
                correct: true,
                mastered: Some(true),
            },
            Judgment::Unmaster => ProgressUpdate {
                correct: false,
                mastered: Some(false),
            },
        }
    }

    /// Only correctness judgments move on to the next card.
    pub fn advances(self) -> bool {
        matches!(self, Judgment::Correct | Judgment::Wrong)
    }
}

/// A judgment that has been accepted locally and must be sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingJudgment {
    pub word_id: WordId,
    pub judgment: Judgment,
}

impl PendingJudgment {
    pub fn update(&self) -> ProgressUpdate {
        self.judgment.update()
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingAdvance {
    due: Instant,
    from: usize,
}

pub struct DeckSession {
    source: DeckSource,
    words: Vec<Word>,
    deck: Vec<Word>,
    cursor: Option<usize>,
    flipped: bool,
    direction: CardDirection,
    policy: DeckPolicy,
    pending: Option<PendingAdvance>,
    advance_delay: Duration,
    rng: Box<dyn RngCore>,
}

impl fmt::Debug for DeckSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeckSession")
            .field("source", &self.source)
            .field("words", &self.words.len())
            .field("deck", &self.deck.len())
            .field("cursor", &self.cursor)
            .field("flipped", &self.flipped)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl DeckSession {
    pub fn new(source: DeckSource, advance_delay: Duration) -> Self {
        Self {
            source,
            words: Vec::new(),
            deck: Vec::new(),
            cursor: None,
            flipped: false,
            direction: CardDirection::default(),
            policy: DeckPolicy::default(),
            pending: None,
            advance_delay,
            rng: Box::new(StdRng::from_os_rng()),
        }
    }

    /// Replaces the random source used for `random` ordering.
    pub fn with_rng(mut self, rng: impl RngCore + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    pub fn source(&self) -> DeckSource {
        self.source
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn deck(&self) -> &[Word] {
        &self.deck
    }

    pub fn len(&self) -> usize {
        self.deck.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deck.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn direction(&self) -> CardDirection {
        self.direction
    }

    pub fn policy(&self) -> DeckPolicy {
        self.policy
    }

    pub fn current(&self) -> Option<&Word> {
        self.cursor.and_then(|i| self.deck.get(i))
    }

    pub fn has_pending_advance(&self) -> bool {
        self.pending.is_some()
    }

    // ---------------- source list ----------------

    /// Installs a freshly fetched source list.
    ///
    /// The deck is rebuilt when the source was empty or its set of ids
    /// changed; otherwise the new field values are patched into the existing
    /// deck and the cursor stays put.
    pub fn set_words(&mut self, words: Vec<Word>) {
        let rebuild = self.words.is_empty() || !same_members(&self.words, &words);
        self.words = words;
        if rebuild {
            self.rebuild();
        } else {
            for slot in self.deck.iter_mut() {
                if let Some(w) = self.words.iter().find(|w| w.id == slot.id) {
                    *slot = w.clone();
                }
            }
        }
    }

    /// Drops everything; used when the notebook selection changes.
    pub fn clear(&mut self) {
        self.words.clear();
        self.deck.clear();
        self.cursor = None;
        self.flipped = false;
        self.pending = None;
    }

    /// Folds an authoritative word from the backend into the source list and
    /// the deck. Unknown ids are ignored. Returns whether anything matched.
    pub fn apply_update(&mut self, updated: &Word) -> bool {
        let mut hit = false;
        for w in self
            .words
            .iter_mut()
            .chain(self.deck.iter_mut())
            .filter(|w| w.id == updated.id)
        {
            *w = updated.clone();
            hit = true;
        }
        hit
    }

    // ---------------- policy ----------------

    /// The wrong-only deck takes direction and order but never hides
    /// mastered words.
    pub fn apply_settings(&mut self, settings: &NotebookSettings) {
        self.direction = settings.default_direction;
        self.flipped = false;
        let policy = DeckPolicy {
            exclude_mastered: settings.exclude_mastered && self.source == DeckSource::All,
            order: settings.default_order,
        };
        if policy != self.policy {
            self.policy = policy;
            self.rebuild();
        }
    }

    pub fn set_exclude_mastered(&mut self, exclude: bool) {
        if self.policy.exclude_mastered != exclude {
            self.policy.exclude_mastered = exclude;
            self.rebuild();
        }
    }

    pub fn set_order(&mut self, order: CardOrder) {
        self.flipped = false;
        if self.policy.order != order {
            self.policy.order = order;
            self.rebuild();
        }
    }

    pub fn set_direction(&mut self, direction: CardDirection) {
        self.direction = direction;
        self.flipped = false;
    }

    fn rebuild(&mut self) {
        let mut deck: Vec<Word> = self
            .words
            .iter()
            .filter(|w| !(self.policy.exclude_mastered && w.mastered))
            .cloned()
            .collect();
        if self.policy.order == CardOrder::Random {
            deck.shuffle(&mut *self.rng);
        }
        self.deck = deck;
        self.cursor = if self.deck.is_empty() { None } else { Some(0) };
        self.flipped = false;
        self.pending = None;
    }

    // ---------------- navigation ----------------

    pub fn previous(&mut self) -> bool {
        match self.cursor {
            Some(i) if i > 0 => {
                self.move_to(i - 1);
                true
            }
            _ => false,
        }
    }

    pub fn next(&mut self) -> bool {
        match self.cursor {
            Some(i) if i + 1 < self.deck.len() => {
                self.move_to(i + 1);
                true
            }
            _ => false,
        }
    }

    fn move_to(&mut self, i: usize) {
        self.cursor = Some(i);
        self.flipped = false;
        self.pending = None;
    }

    pub fn flip(&mut self) {
        if self.cursor.is_some() {
            self.flipped = true;
        }
    }

    /// Turning the card over by hand works both ways.
    pub fn toggle_flip(&mut self) {
        if self.cursor.is_some() {
            self.flipped = !self.flipped;
        }
    }

    pub fn reset_card(&mut self) {
        self.flipped = false;
    }

    // ---------------- judgments ----------------

    /// Accepts a judgment on the current card and, for correct/wrong, arms
    /// the delayed advance unless the card is the last one.
    pub fn judge(&mut self, judgment: Judgment, now: Instant) -> Option<PendingJudgment> {
        let i = self.cursor?;
        let word_id = self.deck.get(i)?.id;
        if judgment.advances() && i + 1 < self.deck.len() {
            self.pending = Some(PendingAdvance {
                due: now + self.advance_delay,
                from: i,
            });
        }
        Some(PendingJudgment { word_id, judgment })
    }

    /// Drops an armed advance, e.g. after the backend rejected the judgment.
    pub fn cancel_advance(&mut self) {
        self.pending = None;
    }

    /// Fires the delayed advance once it is due. The advance is abandoned if
    /// the cursor moved in the meantime or the deck shrank under it.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(p) = self.pending else {
            return false;
        };
        if now < p.due {
            return false;
        }
        self.pending = None;
        if self.cursor == Some(p.from) && p.from + 1 < self.deck.len() {
            self.cursor = Some(p.from + 1);
            self.flipped = false;
            return true;
        }
        false
    }

    /// Judges the current card and waits for the backend's verdict.
    ///
    /// On success the returned word is already folded into the session; on
    /// failure nothing is applied and the armed advance is dropped.
    pub fn record_judgment(
        &mut self,
        backend: &dyn ProgressBackend,
        judgment: Judgment,
        now: Instant,
    ) -> Result<Option<Word>, ApiError> {
        let Some(pj) = self.judge(judgment, now) else {
            return Ok(None);
        };
        match backend.update_progress(pj.word_id, pj.update()) {
            Ok(word) => {
                self.apply_update(&word);
                Ok(Some(word))
            }
            Err(e) => {
                self.cancel_advance();
                Err(e)
            }
        }
    }
}

fn same_members(a: &[Word], b: &[Word]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut x: Vec<WordId> = a.iter().map(|w| w.id).collect();
    let mut y: Vec<WordId> = b.iter().map(|w| w.id).collect();
    x.sort_unstable();
    y.sort_unstable();
    x == y
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    fn word(id: WordId, text: &str, mastered: bool) -> Word {
        Word {
            id,
            word: text.into(),
            meaning: format!("{text}-m"),
            notebook_id: 1,
            correct_count: 0,
            wrong_count: 0,
            mastered,
            last_studied: None,
        }
    }

    fn words(n: i64) -> Vec<Word> {
        (1..=n).map(|i| word(i, &format!("w{i}"), false)).collect()
    }

    fn ids(ws: &[Word]) -> Vec<WordId> {
        ws.iter().map(|w| w.id).collect()
    }

    fn session() -> DeckSession {
        DeckSession::new(DeckSource::All, DEFAULT_ADVANCE_DELAY).with_rng(StdRng::seed_from_u64(7))
    }

    struct FakeBackend {
        fail: bool,
        calls: RefCell<Vec<(WordId, ProgressUpdate)>>,
        words: Vec<Word>,
    }

    impl FakeBackend {
        fn new(words: Vec<Word>) -> Self {
            Self {
                fail: false,
                calls: RefCell::new(Vec::new()),
                words,
            }
        }
    }

    impl ProgressBackend for FakeBackend {
        fn update_progress(&self, id: WordId, update: ProgressUpdate) -> Result<Word, ApiError> {
            self.calls.borrow_mut().push((id, update));
            if self.fail {
                return Err(ApiError::Status {
                    status: 500,
                    detail: None,
                });
            }
            let mut w = self
                .words
                .iter()
                .find(|w| w.id == id)
                .cloned()
                .ok_or(ApiError::Status {
                    status: 404,
                    detail: Some("not found".into()),
                })?;
            if update.correct {
                w.correct_count += 1;
            } else {
                w.wrong_count += 1;
            }
            if let Some(m) = update.mastered {
                w.mastered = m;
            }
            Ok(w)
        }
    }

    #[test]
    fn excluding_mastered_keeps_them_out_of_the_deck() {
        let mut s = session();
        s.set_exclude_mastered(true);
        s.set_words(vec![
            word(1, "apple", false),
            word(2, "dog", true),
            word(3, "cat", false),
            word(4, "sun", true),
        ]);
        assert!(s.deck().iter().all(|w| !w.mastered));
        assert_eq!(ids(s.deck()), vec![1, 3]);
        // source list is untouched
        assert_eq!(s.words().len(), 4);
    }

    #[test]
    fn wrong_only_deck_keeps_mastered_words() {
        let mut s = DeckSession::new(DeckSource::WrongOnly, DEFAULT_ADVANCE_DELAY);
        s.set_words(vec![word(1, "apple", true), word(2, "dog", false)]);
        s.apply_settings(&NotebookSettings {
            exclude_mastered: true,
            default_order: CardOrder::Sequential,
            ..NotebookSettings::default()
        });
        assert!(!s.policy().exclude_mastered);
        assert_eq!(ids(s.deck()), vec![1, 2]);

        let mut all = session();
        all.set_words(vec![word(1, "apple", true), word(2, "dog", false)]);
        all.apply_settings(&NotebookSettings {
            exclude_mastered: true,
            ..NotebookSettings::default()
        });
        assert_eq!(ids(all.deck()), vec![2]);
    }

    #[test]
    fn sequential_order_matches_source() {
        let mut s = session();
        s.set_words(words(6));
        assert_eq!(ids(s.deck()), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn random_order_is_a_permutation() {
        let mut s = session();
        s.set_words(words(20));
        s.set_order(CardOrder::Random);
        let mut got = ids(s.deck());
        got.sort_unstable();
        assert_eq!(got, (1..=20).collect::<Vec<_>>());
        assert_eq!(s.cursor(), Some(0));
    }

    #[test]
    fn random_rebuilds_shuffle_independently() {
        let mut s = session();
        s.set_words(words(20));
        let sequential = ids(s.deck());
        let mut differs = false;
        for _ in 0..5 {
            s.set_order(CardOrder::Sequential);
            s.set_order(CardOrder::Random);
            differs |= ids(s.deck()) != sequential;
        }
        assert!(differs);
    }

    #[test]
    fn apple_dog_scenario() {
        let mut s = session();
        s.apply_settings(&NotebookSettings {
            exclude_mastered: true,
            ..Default::default()
        });
        s.set_words(vec![word(1, "apple", false), word(2, "dog", true)]);
        assert_eq!(ids(s.deck()), vec![1]);
        assert_eq!(s.cursor(), Some(0));
        assert!(!s.next());
        assert_eq!(s.cursor(), Some(0));
    }

    #[test]
    fn empty_source_leaves_cursor_inactive() {
        let mut s = session();
        s.set_words(Vec::new());
        assert_eq!(s.cursor(), None);
        assert!(s.current().is_none());
        assert!(!s.next());
        assert!(!s.previous());
        s.flip();
        assert!(!s.is_flipped());

        s.set_exclude_mastered(true);
        s.set_words(vec![word(1, "a", true)]);
        assert!(s.is_empty());
        assert_eq!(s.cursor(), None);
    }

    #[test]
    fn navigation_stays_in_bounds_and_clears_flip() {
        let mut s = session();
        s.set_words(words(3));
        assert!(!s.previous());
        s.flip();
        assert!(s.next());
        assert!(!s.is_flipped());
        s.flip();
        assert!(s.next());
        assert!(!s.is_flipped());
        assert_eq!(s.cursor(), Some(2));
        s.flip();
        assert!(!s.next());
        // a no-op move leaves the flip alone
        assert!(s.is_flipped());
        assert!(s.previous());
        assert_eq!(s.cursor(), Some(1));
        assert!(!s.is_flipped());
    }

    #[test]
    fn direction_change_clears_flip_without_moving() {
        let mut s = session();
        s.set_words(words(3));
        s.next();
        s.flip();
        s.set_direction(CardDirection::MeaningToWord);
        assert!(!s.is_flipped());
        assert_eq!(s.cursor(), Some(1));
    }

    #[test]
    fn order_change_rebuilds_and_resets_cursor() {
        let mut s = session();
        s.set_words(words(4));
        s.next();
        s.next();
        s.set_order(CardOrder::Random);
        assert_eq!(s.cursor(), Some(0));
        // same order again is not a rebuild
        s.next();
        s.flip();
        s.set_order(CardOrder::Random);
        assert_eq!(s.cursor(), Some(1));
        assert!(!s.is_flipped());
    }

    #[test]
    fn field_updates_patch_in_place() {
        let mut s = session();
        s.set_words(words(4));
        s.set_order(CardOrder::Random);
        s.next();
        s.next();
        let before = ids(s.deck());
        let at = s.current().unwrap().id;

        let mut refreshed = words(4);
        refreshed[0].correct_count = 9;
        refreshed[3].mastered = true;
        s.set_words(refreshed);

        assert_eq!(ids(s.deck()), before);
        assert_eq!(s.cursor(), Some(2));
        assert_eq!(s.current().unwrap().id, at);
        let first = s.deck().iter().find(|w| w.id == 1).unwrap();
        assert_eq!(first.correct_count, 9);
    }

    #[test]
    fn membership_change_rebuilds() {
        let mut s = session();
        s.set_words(words(3));
        s.next();
        let mut more = words(3);
        more.push(word(10, "new", false));
        s.set_words(more);
        assert_eq!(ids(s.deck()), vec![1, 2, 3, 10]);
        assert_eq!(s.cursor(), Some(0));
    }

    #[test]
    fn successful_judgment_patches_both_lists() {
        let src = words(3);
        let backend = FakeBackend::new(src.clone());
        let mut s = session();
        s.set_words(src);
        s.next();
        s.flip();
        let now = Instant::now();
        let got = s
            .record_judgment(&backend, Judgment::Master, now)
            .unwrap()
            .unwrap();
        assert_eq!(got.id, 2);
        assert_eq!(s.cursor(), Some(1));
        assert!(s.current().unwrap().mastered);
        assert!(s.words().iter().find(|w| w.id == 2).unwrap().mastered);
        assert_eq!(s.words()[0], word(1, "w1", false));
        assert_eq!(s.deck()[2], word(3, "w3", false));
        assert_eq!(
            backend.calls.borrow()[0],
            (
                2,
                ProgressUpdate {
                    correct: true,
                    mastered: Some(true)
                }
            )
        );
        // mastery never advances
        assert!(!s.has_pending_advance());
        assert!(!s.tick(now + Duration::from_secs(1)));
        assert_eq!(s.cursor(), Some(1));
    }

    #[test]
    fn correct_judgment_advances_after_delay() {
        let src = words(3);
        let backend = FakeBackend::new(src.clone());
        let mut s = session();
        s.set_words(src);
        s.flip();
        let now = Instant::now();
        let got = s.record_judgment(&backend, Judgment::Correct, now).unwrap();
        assert_eq!(got.unwrap().correct_count, 1);
        assert_eq!(s.cursor(), Some(0));
        assert!(!s.tick(now + Duration::from_millis(100)));
        assert!(s.tick(now + DEFAULT_ADVANCE_DELAY));
        assert_eq!(s.cursor(), Some(1));
        assert!(!s.is_flipped());
    }

    #[test]
    fn last_card_does_not_arm_an_advance() {
        let mut s = session();
        s.set_words(words(2));
        s.next();
        assert!(s.judge(Judgment::Wrong, Instant::now()).is_some());
        assert!(!s.has_pending_advance());
    }

    #[test]
    fn failed_judgment_applies_nothing() {
        let src = words(3);
        let mut backend = FakeBackend::new(src.clone());
        backend.fail = true;
        let mut s = session();
        s.set_words(src.clone());
        let now = Instant::now();
        assert!(s.record_judgment(&backend, Judgment::Correct, now).is_err());
        assert_eq!(s.words(), &src[..]);
        assert_eq!(s.deck(), &src[..]);
        assert!(!s.tick(now + Duration::from_secs(1)));
        assert_eq!(s.cursor(), Some(0));
    }

    #[test]
    fn stale_advance_is_abandoned() {
        let mut s = session();
        s.set_words(words(5));
        let now = Instant::now();
        s.judge(Judgment::Correct, now);
        // manual move in between cancels the deferred one
        s.next();
        assert!(!s.tick(now + Duration::from_secs(1)));
        assert_eq!(s.cursor(), Some(1));

        s.judge(Judgment::Correct, now);
        s.set_order(CardOrder::Random);
        assert!(!s.tick(now + Duration::from_secs(1)));
        assert_eq!(s.cursor(), Some(0));

        s.judge(Judgment::Wrong, now);
        s.clear();
        assert!(!s.tick(now + Duration::from_secs(1)));
        assert_eq!(s.cursor(), None);
    }

    #[test]
    fn late_response_for_unknown_word_is_a_noop() {
        let mut s = session();
        s.set_words(words(2));
        let stranger = word(99, "ghost", true);
        assert!(!s.apply_update(&stranger));
        assert_eq!(ids(s.deck()), vec![1, 2]);
    }

    #[test]
    fn last_response_wins_for_the_same_word() {
        let mut s = session();
        s.set_words(words(2));
        let mut first = word(1, "w1", false);
        first.correct_count = 1;
        let mut second = word(1, "w1", false);
        second.correct_count = 2;
        s.apply_update(&second);
        s.apply_update(&first);
        assert_eq!(s.current().unwrap().correct_count, 1);
        assert_eq!(s.words()[0].correct_count, 1);
    }
}
