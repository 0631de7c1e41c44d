use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use tokio::sync::Mutex;

use super::{NewQuiz, QuizId, QuizRecord};

const EMPTY_QUESTION: &str = "La pregunta no puede estar vacía";
const EMPTY_ANSWER: &str = "La respuesta no puede estar vacía";
const DUPLICATE_QUESTION: &str = "Ya existe esta pregunta";

const SEED: [(&str, &str); 4] = [
    ("Capital de Italia", "Roma"),
    ("Capital de Francia", "París"),
    ("Capital de España", "Madrid"),
    ("Capital de Portugal", "Lisboa"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("El quiz es erroneo")]
    Validation(Vec<FieldError>),
    #[error("No existe un quiz asociado al id={0}.")]
    NotFound(QuizId),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct Snapshot {
    next_id: QuizId,
    quizzes: Vec<QuizRecord>,
}

/// Keyed collection of quizzes shared by every session.
///
/// All state sits behind one async mutex, so each operation is atomic and concurrent
/// writes are applied one after another. When a path is set every write is flushed to it.
pub struct QuizStore {
    path: Option<PathBuf>,
    inner: Mutex<Snapshot>,
}

impl QuizStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            inner: Mutex::new(Snapshot {
                next_id: 1,
                quizzes: Vec::new(),
            }),
        }
    }

    /// Opens (or creates) the JSON file at `path` and seeds it if it holds no quizzes.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Snapshot {
                next_id: 1,
                quizzes: Vec::new(),
            },
            Err(e) => return Err(e.into()),
        };
        info!(
            "Loaded {} quizzes from {}",
            snapshot.quizzes.len(),
            path.display()
        );

        let store = Self {
            path: Some(path),
            inner: Mutex::new(snapshot),
        };
        store.ensure_seeded().await?;
        Ok(store)
    }

    /// Inserts the default quizzes when the store is empty. Calling it again is a no-op.
    pub async fn ensure_seeded(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.quizzes.is_empty() {
            return Ok(());
        }
        let mut next = inner.clone();
        for (question, answer) in SEED {
            let id = next.next_id;
            next.next_id += 1;
            next.quizzes.push(QuizRecord {
                id,
                question: question.to_string(),
                answer: answer.to_string(),
            });
        }
        self.persist(&next).await?;
        *inner = next;
        info!("Seeded the store with {} quizzes", SEED.len());
        Ok(())
    }

    pub async fn find_all(&self) -> Vec<QuizRecord> {
        self.inner.lock().await.quizzes.clone()
    }

    pub async fn find_by_id(&self, id: QuizId) -> Option<QuizRecord> {
        let inner = self.inner.lock().await;
        inner.quizzes.iter().find(|q| q.id == id).cloned()
    }

    pub async fn create(&self, quiz: NewQuiz) -> Result<QuizRecord> {
        let mut inner = self.inner.lock().await;
        check(&inner, None, &quiz.question, &quiz.answer)?;

        let record = QuizRecord {
            id: inner.next_id,
            question: quiz.question,
            answer: quiz.answer,
        };
        let mut next = inner.clone();
        next.next_id += 1;
        next.quizzes.push(record.clone());
        self.persist(&next).await?;
        *inner = next;
        debug!("Created quiz {}", record.id);
        Ok(record)
    }

    pub async fn update(&self, record: &QuizRecord) -> Result<()> {
        let mut inner = self.inner.lock().await;
        check(&inner, Some(record.id), &record.question, &record.answer)?;

        let mut next = inner.clone();
        let slot = next
            .quizzes
            .iter_mut()
            .find(|q| q.id == record.id)
            .ok_or(StoreError::NotFound(record.id))?;
        *slot = record.clone();
        self.persist(&next).await?;
        *inner = next;
        debug!("Updated quiz {}", record.id);
        Ok(())
    }

    /// Removes the quiz and reports whether it existed.
    pub async fn destroy(&self, id: QuizId) -> Result<bool> {
        let mut inner = self.inner.lock().await;
        if !inner.quizzes.iter().any(|q| q.id == id) {
            return Ok(false);
        }
        let mut next = inner.clone();
        next.quizzes.retain(|q| q.id != id);
        self.persist(&next).await?;
        *inner = next;
        debug!("Deleted quiz {}", id);
        Ok(true)
    }

    /// Writes `snapshot` out. Callers commit it to memory only once this succeeds.
    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(snapshot)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn check(snapshot: &Snapshot, own_id: Option<QuizId>, question: &str, answer: &str) -> Result<()> {
    let mut errors = Vec::new();
    if question.is_empty() {
        errors.push(FieldError {
            field: "question",
            message: EMPTY_QUESTION,
        });
    } else if snapshot
        .quizzes
        .iter()
        .any(|q| q.question == question && Some(q.id) != own_id)
    {
        errors.push(FieldError {
            field: "question",
            message: DUPLICATE_QUESTION,
        });
    }
    if answer.is_empty() {
        errors.push(FieldError {
            field: "answer",
            message: EMPTY_ANSWER,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Validation(errors))
    }
}
