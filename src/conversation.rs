//! Interactive conversation loop
//!
//! Greets, then alternates between hearing one utterance and answering it
//! until the user says goodbye, input runs out, or shutdown is signalled.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;

use crate::dispatch::Assistant;
use crate::normalize::normalize;
use crate::voice::{Microphone, SAMPLE_RATE, SpeechToText, Speaker, samples_to_wav};
use crate::Error;

/// Opening line
pub const GREETING: &str = "Hi, I am VAVI. How can I help you?";

/// Reply to a goodbye
pub const FAREWELL: &str = "Goodbye! Have a great day!";

/// Reply when the loop is stopped from outside
pub const MANUAL_EXIT: &str = "Conversation ended manually. Goodbye!";

/// Speech was captured but could not be transcribed
pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't catch that. Please repeat.";

/// Recognition backend unreachable
pub const NETWORK_ERROR: &str = "Network error. Please check your connection.";

/// Any other input failure
pub const INPUT_ERROR: &str = "Sorry, I encountered an error.";

const EXIT_WORDS: [&str; 2] = ["bye", "goodbye"];

/// One attempt at hearing the user
#[derive(Debug)]
pub enum Heard {
    /// Something was said
    Utterance(String),
    /// Audio arrived but produced no words
    NotUnderstood,
    /// Nothing was said before the listen timeout
    Silence,
    /// Capture or recognition failed
    Failed(Error),
    /// The input is exhausted
    Closed,
}

/// Where utterances come from
#[async_trait(?Send)]
pub trait UtteranceSource {
    /// Wait for the next utterance
    async fn listen(&mut self) -> Heard;
}

/// Where the two sides of the conversation are shown
#[async_trait(?Send)]
pub trait Transcript {
    /// Record what the user said
    fn user(&mut self, text: &str);

    /// Present an assistant line, resolving once it has been delivered
    async fn assistant(&mut self, text: &str);
}

/// How a conversation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationEnd {
    /// The user said goodbye
    Farewell,
    /// Shutdown was signalled
    Stopped,
    /// The source ran dry
    SourceClosed,
}

/// Whether an utterance ends the conversation
#[must_use]
pub fn is_farewell(utterance: &str) -> bool {
    let normalized = normalize(utterance);
    EXIT_WORDS.iter().any(|word| normalized.contains(word))
}

/// Run the conversation until it ends
///
/// A message on `shutdown` interrupts a pending listen. Dropping the sender
/// leaves the loop running.
#[allow(clippy::future_not_send)]
pub async fn run_conversation(
    assistant: &Assistant,
    source: &mut dyn UtteranceSource,
    transcript: &mut dyn Transcript,
    shutdown: &mut mpsc::Receiver<()>,
) -> ConversationEnd {
    transcript.assistant(GREETING).await;

    loop {
        let heard = tokio::select! {
            Some(()) = shutdown.recv() => {
                tracing::info!("conversation stopped");
                transcript.assistant(MANUAL_EXIT).await;
                return ConversationEnd::Stopped;
            }
            heard = source.listen() => heard,
        };

        match heard {
            Heard::Utterance(text) => {
                transcript.user(&text);

                if is_farewell(&text) {
                    transcript.assistant(FAREWELL).await;
                    return ConversationEnd::Farewell;
                }

                let reply = assistant.process(&text).await;
                transcript.assistant(&reply).await;
            }
            Heard::Silence => {}
            Heard::NotUnderstood => transcript.assistant(NOT_UNDERSTOOD).await,
            Heard::Failed(e) => {
                tracing::warn!(kind = ?e.kind(), error = %e, "listen failed");
                let message = if e.is_network() { NETWORK_ERROR } else { INPUT_ERROR };
                transcript.assistant(message).await;
            }
            Heard::Closed => {
                tracing::debug!("input closed");
                return ConversationEnd::SourceClosed;
            }
        }
    }
}

/// Microphone plus cloud speech recognition
pub struct MicrophoneSource {
    microphone: Microphone,
    stt: SpeechToText,
}

impl MicrophoneSource {
    #[must_use]
    pub const fn new(microphone: Microphone, stt: SpeechToText) -> Self {
        Self { microphone, stt }
    }
}

#[async_trait(?Send)]
impl UtteranceSource for MicrophoneSource {
    async fn listen(&mut self) -> Heard {
        tracing::info!("listening");

        let samples = match self.microphone.listen().await {
            Ok(Some(samples)) => samples,
            Ok(None) => return Heard::Silence,
            Err(e) => return Heard::Failed(e),
        };

        let wav = match samples_to_wav(&samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => return Heard::Failed(e),
        };

        match self.stt.transcribe(&wav).await {
            Ok(text) if text.is_empty() => Heard::NotUnderstood,
            Ok(text) => Heard::Utterance(text),
            Err(e) => Heard::Failed(e),
        }
    }
}

/// Line-oriented text input
pub struct LineSource<R> {
    lines: Lines<R>,
    prompt: Option<&'static str>,
}

impl LineSource<BufReader<Stdin>> {
    /// Read utterances from standard input
    #[must_use]
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            prompt: Some("You: "),
        }
    }
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    /// Read utterances from any buffered reader, without prompting
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            prompt: None,
        }
    }
}

#[async_trait(?Send)]
impl<R: AsyncBufRead + Unpin> UtteranceSource for LineSource<R> {
    async fn listen(&mut self) -> Heard {
        if let Some(prompt) = self.prompt {
            print!("{prompt}");
            let _ = std::io::stdout().flush();
        }

        match self.lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => Heard::Silence,
            Ok(Some(line)) => Heard::Utterance(line.trim().to_string()),
            Ok(None) => Heard::Closed,
            Err(e) => Heard::Failed(e.into()),
        }
    }
}

/// Prints to stdout and optionally speaks assistant lines
pub struct ConsoleTranscript {
    speaker: Option<Arc<Speaker>>,
    echo_user: bool,
}

impl ConsoleTranscript {
    /// Text-only transcript; the user's own typing is not echoed
    #[must_use]
    pub const fn text() -> Self {
        Self {
            speaker: None,
            echo_user: false,
        }
    }

    /// Transcript that also speaks every assistant line
    #[must_use]
    pub const fn spoken(speaker: Arc<Speaker>) -> Self {
        Self {
            speaker: Some(speaker),
            echo_user: true,
        }
    }
}

#[async_trait(?Send)]
impl Transcript for ConsoleTranscript {
    fn user(&mut self, text: &str) {
        if self.echo_user {
            println!("You: {text}");
        }
    }

    async fn assistant(&mut self, text: &str) {
        println!("VAVI: {text}\n");

        if let Some(speaker) = &self.speaker
            && let Err(e) = speaker.speak(text).await
        {
            tracing::warn!(error = %e, "speech output failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;

    struct ScriptedSource(VecDeque<Heard>);

    #[async_trait(?Send)]
    impl UtteranceSource for ScriptedSource {
        async fn listen(&mut self) -> Heard {
            self.0.pop_front().unwrap_or(Heard::Closed)
        }
    }

    #[derive(Default)]
    struct RecordingTranscript {
        user: Vec<String>,
        assistant: Vec<String>,
    }

    #[async_trait(?Send)]
    impl Transcript for RecordingTranscript {
        fn user(&mut self, text: &str) {
            self.user.push(text.to_string());
        }

        async fn assistant(&mut self, text: &str) {
            self.assistant.push(text.to_string());
        }
    }

    #[test]
    fn test_is_farewell() {
        assert!(is_farewell("bye"));
        assert!(is_farewell("Okay, Goodbye VAVI"));
        assert!(is_farewell("bye bye"));
        assert!(!is_farewell("play some jazz"));
    }

    #[tokio::test]
    async fn test_line_source() {
        let input: &[u8] = b"open notepad\n\n  play jazz  \n";
        let mut source = LineSource::new(input);

        assert!(matches!(source.listen().await, Heard::Utterance(t) if t == "open notepad"));
        assert!(matches!(source.listen().await, Heard::Silence));
        assert!(matches!(source.listen().await, Heard::Utterance(t) if t == "play jazz"));
        assert!(matches!(source.listen().await, Heard::Closed));
    }

    #[tokio::test]
    async fn test_failed_listen_messages() {
        let assistant = crate::dispatch::tests::test_assistant();
        let mut source = ScriptedSource(VecDeque::from([
            Heard::NotUnderstood,
            Heard::Failed(Error::Audio("device unplugged".to_string())),
            Heard::Silence,
            Heard::Utterance("goodbye".to_string()),
        ]));
        let mut transcript = RecordingTranscript::default();
        let (_tx, mut rx) = mpsc::channel(1);

        let end = run_conversation(&assistant, &mut source, &mut transcript, &mut rx).await;

        assert_eq!(end, ConversationEnd::Farewell);
        assert_eq!(
            transcript.assistant,
            [GREETING, NOT_UNDERSTOOD, INPUT_ERROR, FAREWELL]
        );
        assert_eq!(transcript.user, ["goodbye"]);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_listen() {
        struct Forever;

        #[async_trait(?Send)]
        impl UtteranceSource for Forever {
            async fn listen(&mut self) -> Heard {
                std::future::pending::<Heard>().await
            }
        }

        let assistant = crate::dispatch::tests::test_assistant();
        let mut transcript = RecordingTranscript::default();
        let (tx, mut rx) = mpsc::channel(1);
        tx.send(()).await.unwrap();

        let end = run_conversation(&assistant, &mut Forever, &mut transcript, &mut rx).await;

        assert_eq!(end, ConversationEnd::Stopped);
        assert_eq!(transcript.assistant, [GREETING, MANUAL_EXIT]);
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_keeps_running() {
        let assistant = crate::dispatch::tests::test_assistant();
        let mut source = ScriptedSource(VecDeque::from([Heard::Silence]));
        let mut transcript = RecordingTranscript::default();
        let (tx, mut rx) = mpsc::channel(1);
        drop(tx);

        let end = run_conversation(&assistant, &mut source, &mut transcript, &mut rx).await;

        assert_eq!(end, ConversationEnd::SourceClosed);
        assert_eq!(transcript.assistant, [GREETING]);
    }
}
