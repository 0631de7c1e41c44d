use std::sync::Arc;

use colored::{Color, Colorize};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::channel::{Channel, ChannelError};
use crate::quiz::play::play;
use crate::quiz::store::{QuizStore, StoreError};
use crate::quiz::validate::{validate_id, IdError};
use crate::quiz::{NewQuiz, QuizId, QuizRecord};

const HELP_TEXT: [&str; 11] = [
    "Comandos:",
    "  h|help - Muestra esta ayuda.",
    "  list - Listar los quizzes existentes.",
    "  show <id> - Muestra la pregunta y la respuesta el quiz indicado.",
    "  add - Añadir un nuevo quiz interactivamente.",
    "  delete <id> - Borrar el quiz indicado.",
    "  edit <id> - Editar el quiz indicado.",
    "  test <id> - Probar el quiz indicado.",
    "  p|play - Jugar a preguntar aleatoriamente todos los quizzes.",
    "  credits - Créditos.",
    "  q|quit - Salir del programa.",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    List,
    Show(Option<String>),
    Add,
    Delete(Option<String>),
    Edit(Option<String>),
    Test(Option<String>),
    Play,
    Credits,
    Quit,
}

impl Command {
    /// Parses one input line. `Ok(None)` is a blank line, `Err` carries an unknown command name.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let arg = words.next().map(str::to_string);

        let command = match name.to_lowercase().as_str() {
            "h" | "help" => Command::Help,
            "list" => Command::List,
            "show" => Command::Show(arg),
            "add" => Command::Add,
            "delete" => Command::Delete(arg),
            "edit" => Command::Edit(arg),
            "test" => Command::Test(arg),
            "p" | "play" => Command::Play,
            "credits" => Command::Credits,
            "q" | "quit" => Command::Quit,
            _ => return Err(name.to_string()),
        };
        Ok(Some(command))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error("No existe un quiz asociado al id={0}.")]
    NotFound(QuizId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One client's conversation: reads commands, runs them against the shared store.
pub struct Session<R, W> {
    channel: Channel<R, W>,
    store: Arc<QuizStore>,
    rng: StdRng,
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(channel: Channel<R, W>, store: Arc<QuizStore>) -> Self {
        Self::with_rng(channel, store, StdRng::from_entropy())
    }

    pub fn with_rng(channel: Channel<R, W>, store: Arc<QuizStore>, rng: StdRng) -> Self {
        Self {
            channel,
            store,
            rng,
        }
    }

    #[cfg(test)]
    pub fn into_channel(self) -> Channel<R, W> {
        self.channel
    }

    /// Serves commands until `quit` or until the client goes away.
    pub async fn run(&mut self) -> Result<(), ChannelError> {
        self.channel.prompt().await?;
        while let Some(line) = self.channel.read_command().await? {
            if self.execute(&line).await? == Flow::Quit {
                return Ok(());
            }
            self.channel.prompt().await?;
        }
        debug!("Client went away without quitting");
        Ok(())
    }

    /// Runs one command line. Failures are reported to the client; only channel errors escape.
    pub async fn execute(&mut self, line: &str) -> Result<Flow, ChannelError> {
        let command = match Command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(Flow::Continue),
            Err(name) => {
                self.channel
                    .write_error(format!("Comando desconocido: '{}'", name.red()))
                    .await?;
                self.channel
                    .write_error("Use 'help' para ver todos los comandos disponibles.")
                    .await?;
                return Ok(Flow::Continue);
            }
        };
        debug!("Executing {command:?}");

        let result = match command {
            Command::Help => self.help().await,
            Command::List => self.list().await,
            Command::Show(id) => self.show(id.as_deref()).await,
            Command::Add => self.add().await,
            Command::Delete(id) => self.delete(id.as_deref()).await,
            Command::Edit(id) => self.edit(id.as_deref()).await,
            Command::Test(id) => self.test(id.as_deref()).await,
            Command::Play => self.play().await,
            Command::Credits => self.credits().await,
            Command::Quit => {
                self.channel.close().await?;
                return Ok(Flow::Quit);
            }
        };

        match result {
            Ok(()) => Ok(Flow::Continue),
            Err(CommandError::Channel(e)) => Err(e),
            Err(e) => {
                self.report(e).await?;
                Ok(Flow::Continue)
            }
        }
    }

    async fn report(&mut self, error: CommandError) -> Result<(), ChannelError> {
        match error {
            CommandError::Store(StoreError::Validation(errors)) => {
                self.channel.write_error("El quiz es erroneo: ").await?;
                for error in errors {
                    debug!("Rejected {}: {}", error.field, error.message);
                    self.channel.write_error(error.message).await?;
                }
            }
            CommandError::Store(e) => {
                warn!("Store failure: {e}");
                self.channel.write_error(e).await?;
            }
            other => self.channel.write_error(other).await?,
        }
        Ok(())
    }

    async fn find(&self, raw_id: Option<&str>) -> Result<QuizRecord, CommandError> {
        let id = validate_id(raw_id)?;
        self.store
            .find_by_id(id)
            .await
            .ok_or(CommandError::NotFound(id))
    }

    async fn help(&mut self) -> Result<(), CommandError> {
        for line in HELP_TEXT {
            self.channel.write_line(line).await?;
        }
        Ok(())
    }

    async fn list(&mut self) -> Result<(), CommandError> {
        for quiz in self.store.find_all().await {
            self.channel
                .write_line(format!(
                    " [{}]: {}",
                    quiz.id.to_string().magenta(),
                    quiz.question
                ))
                .await?;
        }
        Ok(())
    }

    async fn show(&mut self, raw_id: Option<&str>) -> Result<(), CommandError> {
        let quiz = self.find(raw_id).await?;
        self.channel
            .write_line(format!(
                " [{}]: {} {} {}",
                quiz.id.to_string().magenta(),
                quiz.question,
                "=>".magenta(),
                quiz.answer
            ))
            .await?;
        Ok(())
    }

    async fn add(&mut self) -> Result<(), CommandError> {
        let question = self.channel.prompt_line(" Introduzca una pregunta: ").await?;
        let answer = self.channel.prompt_line(" Introduzca la respuesta: ").await?;

        let quiz = self.store.create(NewQuiz::new(question, answer)).await?;
        self.channel
            .write_line(format!(
                " {}: {} {} {}",
                "Se ha añadido".magenta(),
                quiz.question,
                "=>".magenta(),
                quiz.answer
            ))
            .await?;
        Ok(())
    }

    async fn delete(&mut self, raw_id: Option<&str>) -> Result<(), CommandError> {
        let quiz = self.find(raw_id).await?;
        if !self.store.destroy(quiz.id).await? {
            return Err(CommandError::NotFound(quiz.id));
        }
        self.channel
            .write_line(format!(" Se ha borrado el quiz {}.", quiz.id.to_string().magenta()))
            .await?;
        Ok(())
    }

    async fn edit(&mut self, raw_id: Option<&str>) -> Result<(), CommandError> {
        let mut quiz = self.find(raw_id).await?;
        let question = self.channel.prompt_line(" Introduzca la pregunta: ").await?;
        let answer = self.channel.prompt_line(" Introduzca la respuesta: ").await?;
        quiz.question = question;
        quiz.answer = answer;

        self.store.update(&quiz).await?;
        self.channel
            .write_line(format!(
                " Se ha cambiado el quiz {} por: {} {} {}",
                quiz.id.to_string().magenta(),
                quiz.question,
                "=>".magenta(),
                quiz.answer
            ))
            .await?;
        Ok(())
    }

    async fn test(&mut self, raw_id: Option<&str>) -> Result<(), CommandError> {
        let quiz = self.find(raw_id).await?;
        let reply = self
            .channel
            .prompt_line(&format!("{}? ", quiz.question))
            .await?;

        if quiz.is_answered_by(&reply) {
            self.channel.write_line("CORRECTO").await?;
            self.channel.write_emphasized("CORRECTO", Color::Green).await?;
        } else {
            self.channel.write_line("INCORRECTO").await?;
            self.channel.write_emphasized("INCORRECTO", Color::Red).await?;
        }
        Ok(())
    }

    async fn play(&mut self) -> Result<(), CommandError> {
        let game = play(&mut self.channel, &self.store, &mut self.rng).await?;
        debug!("Play finished: {}/{}", game.score(), game.total());
        Ok(())
    }

    async fn credits(&mut self) -> Result<(), CommandError> {
        self.channel.write_line("Autores de la práctica:").await?;
        for author in env!("CARGO_PKG_AUTHORS").split(':') {
            self.channel.write_line(author.green()).await?;
        }
        Ok(())
    }
}
