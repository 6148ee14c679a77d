// ── Interactive command session ──
//
// Explicit state machine for one operator working against one appliance:
//
//   Idle → DirectorySelected → SessionActive → {AwaitingInput ⇄ Processing} → Terminated
//
// Each `handle_line` call is one loop iteration: classify the input, make
// at most one network call, and hand back exactly one `Reply` to render.
// Errors inside the loop are returned as replies; nothing here ends the
// session except `quit` or end of input.

use strum::{Display, EnumString};
use tracing::{debug, info, warn};

use crate::directory::Directory;
use crate::error::CoreError;
use crate::model::{
    ApplianceDetails, ApplianceInfo, ApplianceRecord, CapabilityCatalog, CommandRequest,
    CommandResult, PreflightNote, StateSnapshot,
};
use crate::service::ApplianceService;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    Idle,
    DirectorySelected,
    SessionActive,
    AwaitingInput,
    Processing,
    Terminated,
}

// ── Input classification ────────────────────────────────────────────

/// Reserved non-JSON inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Directive {
    #[strum(serialize = "state", serialize = "s")]
    State,
    #[strum(serialize = "help", serialize = "h")]
    Help,
    #[strum(serialize = "quit", serialize = "q")]
    Quit,
}

/// Directive reference shown by `help`.
pub const DIRECTIVE_HELP: &[(&str, &str)] = &[
    ("state, s", "fetch and show the appliance's reported state"),
    ("help, h", "show this reference"),
    ("quit, q", "end the session"),
    ("{...}", "submit a single-line JSON object as a command"),
];

/// One line of operator input, classified before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Empty,
    Directive(Directive),
    Payload(&'a str),
}

impl<'a> Input<'a> {
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        line.parse()
            .map_or(Self::Payload(line), Self::Directive)
    }
}

// ── Session context ─────────────────────────────────────────────────

/// Per-session command counter. The first submitted command is number 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionCounters {
    commands: u64,
}

impl SessionCounters {
    /// Commands submitted so far.
    pub fn commands(&self) -> u64 {
        self.commands
    }

    fn next(&mut self) -> u64 {
        self.commands += 1;
        self.commands
    }
}

/// Everything one active session threads through its iterations.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub appliance: ApplianceRecord,
    pub info: ApplianceInfo,
    pub catalog: CapabilityCatalog,
    pub counters: SessionCounters,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Re-fetch the state after every accepted command.
    pub state_after: bool,
}

// ── Replies ─────────────────────────────────────────────────────────

/// Outcome of one submitted command.
#[derive(Debug)]
pub struct CommandReport {
    /// Sequence number within the session.
    pub seq: u64,
    pub request: CommandRequest,
    /// Advisory catalog findings; never block submission.
    pub notes: Vec<PreflightNote>,
    /// The service verdict, or why none was obtained.
    pub outcome: Result<CommandResult, CoreError>,
    /// Follow-up state read, when enabled and the command was accepted.
    pub state_after: Option<StateSnapshot>,
}

/// What one loop iteration produced.
#[derive(Debug)]
pub enum Reply {
    /// Blank line.
    Nothing,
    Help,
    State(StateSnapshot),
    Command(Box<CommandReport>),
    /// Input was not a JSON object; nothing was sent.
    ParseError(CoreError),
    /// A directive's network call failed.
    Failure(CoreError),
    Quit,
}

// ── Session ─────────────────────────────────────────────────────────

pub struct Session<'a, S> {
    service: &'a S,
    options: SessionOptions,
    state: SessionState,
    directory: Directory,
    selected: Option<usize>,
    context: Option<SessionContext>,
}

impl<'a, S: ApplianceService + Sync> Session<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self {
            service,
            options: SessionOptions::default(),
            state: SessionState::Idle,
            directory: Directory::default(),
            selected: None,
            context: None,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn selected(&self) -> Option<&ApplianceRecord> {
        self.selected.and_then(|i| self.directory.get(i))
    }

    pub fn context(&self) -> Option<&SessionContext> {
        self.context.as_ref()
    }

    /// Fetch the appliance listing. An empty listing is an error.
    pub async fn load_directory(&mut self) -> Result<&Directory, CoreError> {
        let directory = Directory::fetch(self.service).await?;
        if directory.is_empty() {
            return Err(CoreError::EmptyDirectory);
        }
        self.directory = directory;
        self.selected = None;
        Ok(&self.directory)
    }

    /// Pick an appliance by 1-based index or exact id.
    ///
    /// Invalid input leaves the state unchanged and returns `None`.
    pub fn select(&mut self, input: &str) -> Option<&ApplianceRecord> {
        if !matches!(
            self.state,
            SessionState::Idle | SessionState::DirectorySelected
        ) {
            return None;
        }
        let position = self.directory.select(input)?;
        self.selected = Some(position);
        advance(&mut self.state, SessionState::DirectorySelected);
        self.directory.get(position)
    }

    /// Enter the session for the selected appliance.
    ///
    /// Loads the appliance info and capability catalog (an unknown
    /// appliance is fatal, other failures leave both empty) and returns the
    /// initial state snapshot when it could be read. A model reported by
    /// the info replaces the listing's.
    pub async fn activate(&mut self) -> Result<Option<StateSnapshot>, CoreError> {
        let appliance = match (self.state, self.selected()) {
            (SessionState::DirectorySelected, Some(record)) => record.clone(),
            _ => {
                return Err(CoreError::Internal(
                    "no appliance selected to activate".into(),
                ));
            }
        };
        let id = appliance.appliance_id.as_str();

        let ApplianceDetails { info, catalog } = match self.service.get_details(id).await {
            Ok(details) => details,
            Err(e @ CoreError::NotFound { .. }) => {
                self.selected = None;
                advance(&mut self.state, SessionState::Idle);
                return Err(e);
            }
            Err(e) => {
                warn!(appliance_id = id, error = %e, "appliance info unavailable, continuing without capabilities");
                ApplianceDetails::default()
            }
        };
        info!(
            appliance_id = id,
            capabilities = catalog.len(),
            writable = catalog.writable_count(),
            "session started"
        );

        let initial = match self.service.get_state(id).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(appliance_id = id, error = %e, "initial state unavailable");
                None
            }
        };

        self.context = Some(SessionContext {
            appliance: appliance.with_info(&info),
            info,
            catalog,
            counters: SessionCounters::default(),
        });
        advance(&mut self.state, SessionState::SessionActive);
        Ok(initial)
    }

    /// Run one loop iteration. `None` is end of input.
    pub async fn handle_line(&mut self, line: Option<&str>) -> Reply {
        if self.state == SessionState::Terminated {
            return Reply::Quit;
        }
        let Some(line) = line else {
            debug!("end of input");
            advance(&mut self.state, SessionState::Terminated);
            return Reply::Quit;
        };
        let service = self.service;
        let Some(ctx) = self.context.as_mut() else {
            return Reply::Failure(CoreError::Internal(
                "no active appliance session".into(),
            ));
        };
        if self.state == SessionState::SessionActive {
            advance(&mut self.state, SessionState::AwaitingInput);
        }
        let id = ctx.appliance.appliance_id.as_str();

        match Input::classify(line) {
            Input::Empty => Reply::Nothing,
            Input::Directive(Directive::Help) => Reply::Help,
            Input::Directive(Directive::Quit) => {
                advance(&mut self.state, SessionState::Terminated);
                Reply::Quit
            }
            Input::Directive(Directive::State) => {
                advance(&mut self.state, SessionState::Processing);
                let reply = match service.get_state(id).await {
                    Ok(snapshot) => Reply::State(snapshot),
                    Err(e) => Reply::Failure(e),
                };
                advance(&mut self.state, SessionState::AwaitingInput);
                reply
            }
            Input::Payload(text) => {
                let request = match CommandRequest::parse(text) {
                    Ok(request) => request,
                    Err(e) => return Reply::ParseError(e),
                };
                let seq = ctx.counters.next();
                let notes = ctx.catalog.preflight(&request);
                for note in &notes {
                    debug!(seq, %note, "pre-flight note");
                }

                advance(&mut self.state, SessionState::Processing);
                let outcome = service.execute_command(id, &request).await;
                let state_after = match &outcome {
                    Ok(result) if result.is_accepted() && self.options.state_after => {
                        service
                            .get_state(id)
                            .await
                            .inspect_err(|e| warn!(error = %e, "state after command unavailable"))
                            .ok()
                    }
                    _ => None,
                };
                advance(&mut self.state, SessionState::AwaitingInput);

                Reply::Command(Box::new(CommandReport {
                    seq,
                    request,
                    notes,
                    outcome,
                    state_after,
                }))
            }
        }
    }
}

fn advance(state: &mut SessionState, next: SessionState) {
    if *state != next {
        debug!(from = %state, to = %next, "session transition");
        *state = next;
    }
}
