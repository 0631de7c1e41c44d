use colored::{Color, Colorize};
use log::debug;
use rand::Rng;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::channel::{Channel, ChannelError};
use crate::quiz::store::QuizStore;
use crate::quiz::QuizRecord;

/// Steps of one game. Every transition goes through [`Game`], so the pool and the score
/// always add up to the number of quizzes loaded at the start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayState {
    Loading,
    Asking,
    Scoring { index: usize, reply: String },
    Won,
    Lost,
}

/// Quizzes not answered yet, plus the running score.
#[derive(Debug, Clone, Default)]
pub struct Game {
    pool: Vec<QuizRecord>,
    score: usize,
    total: usize,
}

impl Game {
    pub fn new(quizzes: Vec<QuizRecord>) -> Self {
        Self {
            total: quizzes.len(),
            pool: quizzes,
            score: 0,
        }
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn remaining(&self) -> usize {
        self.pool.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Uniformly random index into the pool, or `None` once it is exhausted.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> Option<usize> {
        if self.pool.is_empty() {
            return None;
        }
        let index = (rng.gen::<f64>() * self.pool.len() as f64).floor() as usize;
        Some(index.min(self.pool.len() - 1))
    }

    fn quiz(&self, index: usize) -> Option<&QuizRecord> {
        self.pool.get(index)
    }

    /// Checks `reply` against the quiz at `index`. A correct reply scores and removes it;
    /// an index outside the pool never scores.
    fn score_reply(&mut self, index: usize, reply: &str) -> bool {
        match self.pool.get(index) {
            Some(quiz) if quiz.is_answered_by(reply) => {
                self.pool.remove(index);
                self.score += 1;
                true
            }
            _ => false,
        }
    }
}

/// Asks every quiz once in random order until one is missed or none are left.
///
/// Returns the final game so callers can inspect the score.
pub async fn play<R, W, G>(
    channel: &mut Channel<R, W>,
    store: &QuizStore,
    rng: &mut G,
) -> Result<Game, ChannelError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    G: Rng,
{
    let mut game = Game::default();
    let mut state = PlayState::Loading;

    loop {
        state = match state {
            PlayState::Loading => {
                game = Game::new(store.find_all().await);
                debug!("Game started with {} quizzes", game.total());
                PlayState::Asking
            }
            PlayState::Asking => match game.pick(rng).and_then(|i| Some((i, game.quiz(i)?))) {
                None => PlayState::Won,
                Some((index, quiz)) => {
                    let question = format!("{}?", quiz.question);
                    let reply = channel.prompt_line(&question).await?;
                    PlayState::Scoring { index, reply }
                }
            },
            PlayState::Scoring { index, reply } => {
                if game.score_reply(index, &reply) {
                    channel.write_line("CORRECTO").await?;
                    channel
                        .write_line(format!("Aciertos: {}", game.score()))
                        .await?;
                    channel
                        .write_emphasized(&game.score().to_string(), Color::Magenta)
                        .await?;
                    PlayState::Asking
                } else {
                    channel.write_line("INCORRECTO.").await?;
                    PlayState::Lost
                }
            }
            PlayState::Won => {
                channel.write_line("No hay más preguntas".green()).await?;
                break;
            }
            PlayState::Lost => break,
        };
    }

    channel
        .write_line(format!(
            "Fin del juego. Has acertado un total de {} preguntas.",
            game.score()
        ))
        .await?;
    channel
        .write_emphasized(&game.score().to_string(), Color::Magenta)
        .await?;
    debug!(
        "Game finished with score {}/{}, {} left unanswered",
        game.score(),
        game.total(),
        game.remaining()
    );
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::tests::no_colors;
    use crate::quiz::NewQuiz;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn quizzes(n: usize) -> Vec<QuizRecord> {
        (0..n)
            .map(|i| QuizRecord {
                id: i as i64 + 1,
                question: format!("Q{i}"),
                answer: format!("A{i}"),
            })
            .collect()
    }

    async fn seeded_store() -> QuizStore {
        let store = QuizStore::in_memory();
        store
            .create(NewQuiz::new("Capital de Italia", "Roma"))
            .await
            .unwrap();
        store
            .create(NewQuiz::new("Capital de Francia", "París"))
            .await
            .unwrap();
        store
            .create(NewQuiz::new("Capital de España", "Madrid"))
            .await
            .unwrap();
        store
    }

    fn answer_for(prompt: &str) -> &'static str {
        match prompt {
            "Capital de Italia?" => " roma ",
            "Capital de Francia?" => "PARÍS",
            "Capital de España?" => "madrid",
            other => panic!("unexpected prompt {other:?}"),
        }
    }

    #[test]
    fn pick_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let game = Game::new(quizzes(3));
        let mut seen = [false; 3];
        for _ in 0..200 {
            seen[game.pick(&mut rng).unwrap()] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn pick_on_empty_pool() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(Game::new(Vec::new()).pick(&mut rng), None);
    }

    #[test]
    fn pool_and_score_add_up() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut game = Game::new(quizzes(5));
        while let Some(index) = game.pick(&mut rng) {
            let answer = game.quiz(index).unwrap().answer.to_lowercase();
            assert!(!game.score_reply(index, "wrong"));
            assert_eq!(game.remaining() + game.score(), game.total());
            assert!(game.score_reply(index, &answer));
            assert_eq!(game.remaining() + game.score(), game.total());
        }
        assert_eq!(game.score(), 5);
    }

    #[test]
    fn out_of_range_index_never_scores() {
        let mut game = Game::new(quizzes(2));
        assert!(game.quiz(2).is_none());
        assert!(!game.score_reply(2, "A0"));
        assert_eq!(game.remaining(), 2);
        assert_eq!(game.score(), 0);
    }

    #[tokio::test]
    async fn empty_store_wins_immediately() {
        no_colors();
        let store = QuizStore::in_memory();
        let mut channel = Channel::new(&b""[..], Vec::new());
        let mut rng = StdRng::seed_from_u64(1);

        let game = play(&mut channel, &store, &mut rng).await.unwrap();
        assert_eq!(game.score(), 0);
        assert_eq!(game.remaining(), 0);

        let (_, out) = channel.into_parts();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("No hay más preguntas\n"));
        assert!(out.contains("Fin del juego. Has acertado un total de 0 preguntas."));
    }

    #[tokio::test]
    async fn answering_everything_wins() {
        no_colors();
        let store = seeded_store().await;

        // Replay the picks with an identical rng to know the order of the prompts.
        let mut oracle_rng = StdRng::seed_from_u64(99);
        let mut oracle = Game::new(store.find_all().await);
        let mut input = String::new();
        while let Some(index) = oracle.pick(&mut oracle_rng) {
            let prompt = format!("{}?", oracle.quiz(index).unwrap().question);
            let answer = answer_for(&prompt);
            input.push_str(answer);
            input.push('\n');
            assert!(oracle.score_reply(index, answer));
        }

        let mut channel = Channel::new(input.as_bytes(), Vec::new());
        let mut rng = StdRng::seed_from_u64(99);
        let game = play(&mut channel, &store, &mut rng).await.unwrap();
        assert_eq!(game.score(), 3);
        assert_eq!(game.remaining(), 0);

        let (_, out) = channel.into_parts();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Aciertos: 1\n"));
        assert!(out.contains("Aciertos: 3\n"));
        assert!(out.contains("No hay más preguntas"));
        assert!(out.contains("Fin del juego. Has acertado un total de 3 preguntas."));
        assert!(!out.contains("INCORRECTO"));
        // The store is untouched by a game.
        assert_eq!(store.find_all().await.len(), 3);
    }

    #[tokio::test]
    async fn first_miss_loses() {
        no_colors();
        let store = seeded_store().await;
        let mut channel = Channel::new(&b"Lisboa\nRoma\n"[..], Vec::new());
        let mut rng = StdRng::seed_from_u64(5);

        let game = play(&mut channel, &store, &mut rng).await.unwrap();
        assert_eq!(game.score(), 0);
        assert_eq!(game.remaining(), 3);

        let (rest, out) = channel.into_parts();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("INCORRECTO."));
        assert!(out.contains("Fin del juego. Has acertado un total de 0 preguntas."));
        assert!(!out.contains("No hay más preguntas"));
        // Only one answer was consumed.
        assert_eq!(rest, &b"Roma\n"[..]);
    }

    #[tokio::test]
    async fn question_prompt_has_no_trailing_space() {
        no_colors();
        let store = QuizStore::in_memory();
        store.create(NewQuiz::new("Capital de Italia", "Roma")).await.unwrap();
        let mut channel = Channel::new(&b"Roma\n"[..], Vec::new());
        let mut rng = StdRng::seed_from_u64(3);

        play(&mut channel, &store, &mut rng).await.unwrap();
        let (_, out) = channel.into_parts();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("Capital de Italia?CORRECTO\n"));
    }

    #[tokio::test]
    async fn closed_channel_aborts_game() {
        let store = seeded_store().await;
        let mut channel = Channel::new(&b""[..], Vec::new());
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            play(&mut channel, &store, &mut rng).await,
            Err(ChannelError::Closed)
        ));
    }
}
