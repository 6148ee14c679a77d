#![allow(clippy::unwrap_used)]
// Drives the session state machine against an in-memory service.

use std::collections::VecDeque;
use std::sync::Mutex;

use appliprobe_api::types::ApplianceSummary;
use appliprobe_core::export::{CAPABILITIES_MARKER, STATE_MARKER, export_appliance};
use appliprobe_core::{
    ApplianceDetails, ApplianceService, CommandRequest, CommandResult, CoreError, Reply, Session,
    SessionOptions, SessionState, StateSnapshot,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

const OVEN_ID: &str = "944188772-00-31862190-443E07363DAB";

// ── Fake service ────────────────────────────────────────────────────

/// How a fake lookup answers.
#[derive(Debug, Clone, Copy)]
enum Answer {
    Serve,
    NotFound,
    Timeout,
}

impl Answer {
    fn to_result<T>(self, appliance_id: &str, value: T) -> Result<T, CoreError> {
        match self {
            Self::Serve => Ok(value),
            Self::NotFound => Err(CoreError::NotFound {
                entity_type: "Appliance".into(),
                identifier: appliance_id.to_owned(),
            }),
            Self::Timeout => Err(CoreError::Timeout),
        }
    }
}

struct FakeService {
    listing: Value,
    state: Value,
    state_answer: Answer,
    info: Value,
    capabilities: Value,
    details_answer: Answer,
    verdicts: Mutex<VecDeque<Result<CommandResult, CoreError>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeService {
    fn oven() -> Self {
        Self {
            listing: json!([{
                "applianceId": OVEN_ID,
                "connectionState": "Connected",
                "applianceData": { "applianceName": "My Oven" }
            }]),
            state: json!({
                "applianceId": OVEN_ID,
                "connectionState": "Connected",
                "properties": { "reported": { "cavityLight": false, "applianceState": "IDLE" } }
            }),
            state_answer: Answer::Serve,
            info: json!({ "brand": "Electrolux" }),
            capabilities: json!({
                "cavityLight": { "access": "readwrite", "type": "boolean" },
                "targetTemperatureC": {
                    "access": "readwrite", "type": "temperature", "min": 30, "max": 250, "step": 5
                }
            }),
            details_answer: Answer::Serve,
            verdicts: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn queue(&self, verdict: Result<CommandResult, CoreError>) {
        self.verdicts.lock().unwrap().push_back(verdict);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ApplianceService for FakeService {
    async fn list_appliances(&self) -> Result<Vec<ApplianceSummary>, CoreError> {
        self.record("list".into());
        Ok(serde_json::from_value(self.listing.clone()).unwrap())
    }

    async fn get_state(&self, appliance_id: &str) -> Result<StateSnapshot, CoreError> {
        self.record(format!("state {appliance_id}"));
        self.state_answer
            .to_result(appliance_id, StateSnapshot::new(self.state.clone()))
    }

    async fn get_details(&self, appliance_id: &str) -> Result<ApplianceDetails, CoreError> {
        self.record(format!("details {appliance_id}"));
        let details = ApplianceDetails::from_parts(self.info.clone(), self.capabilities.clone());
        self.details_answer.to_result(appliance_id, details)
    }

    async fn execute_command(
        &self,
        appliance_id: &str,
        request: &CommandRequest,
    ) -> Result<CommandResult, CoreError> {
        self.record(format!("command {appliance_id} {}", request.to_json()));
        self.verdicts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(CommandResult::Accepted {
                response_body: Value::Null,
            }))
    }
}

async fn active_session(service: &FakeService) -> Session<'_, FakeService> {
    let mut session = Session::new(service);
    session.load_directory().await.unwrap();
    session.select("1").unwrap();
    session.activate().await.unwrap();
    session
}

fn commands(session: &Session<'_, FakeService>) -> u64 {
    session.context().unwrap().counters.commands()
}

// ── Operator walkthroughs ──────────────────────────────────────────────

#[tokio::test]
async fn directory_and_selection() {
    let service = FakeService::oven();
    let mut session = Session::new(&service);
    assert_eq!(session.state(), SessionState::Idle);

    let dir = session.load_directory().await.unwrap();
    assert_eq!(dir.len(), 1);
    let oven = dir.get(0).unwrap();
    assert_eq!(oven.display_name, "My Oven");
    assert_eq!(oven.resolved_model, "944188772");

    assert!(session.select("2").is_none());
    assert!(session.select("zero").is_none());
    assert_eq!(session.state(), SessionState::Idle);

    assert_eq!(session.select("1").unwrap().appliance_id, OVEN_ID);
    assert_eq!(session.state(), SessionState::DirectorySelected);

    let initial = session.activate().await.unwrap();
    assert_eq!(session.state(), SessionState::SessionActive);
    assert!(initial.is_some());
    let ctx = session.context().unwrap();
    assert_eq!(ctx.appliance.appliance_id, OVEN_ID);
    assert_eq!(ctx.catalog.len(), 2);
    assert_eq!(ctx.counters.commands(), 0);
}

#[tokio::test]
async fn state_directive() {
    let service = FakeService::oven();
    let mut session = active_session(&service).await;

    match session.handle_line(Some("state")).await {
        Reply::State(snapshot) => {
            assert!(snapshot.to_pretty().contains("\"connectionState\""));
            assert_eq!(snapshot.appliance_state(), Some("IDLE"));
        }
        other => panic!("expected State, got {other:?}"),
    }
    assert_eq!(session.state(), SessionState::AwaitingInput);
    assert_eq!(commands(&session), 0);
}

#[tokio::test]
async fn accepted_command() {
    let service = FakeService::oven();
    service.queue(Ok(CommandResult::Accepted {
        response_body: json!({ "status": "OK" }),
    }));
    let mut session = active_session(&service).await;

    match session.handle_line(Some(r#"{"cavityLight": true}"#)).await {
        Reply::Command(report) => {
            assert_eq!(report.seq, 1);
            assert!(report.notes.is_empty());
            assert_eq!(
                report.outcome.unwrap(),
                CommandResult::Accepted {
                    response_body: json!({ "status": "OK" })
                }
            );
            assert!(report.state_after.is_none());
        }
        other => panic!("expected Command, got {other:?}"),
    }
    assert_eq!(commands(&session), 1);
    assert_eq!(session.state(), SessionState::AwaitingInput);
}

#[tokio::test]
async fn out_of_bounds_is_still_submitted() {
    let service = FakeService::oven();
    service.queue(Ok(CommandResult::Rejected {
        error_code: "COMMAND_VALIDATION_ERROR".into(),
        message: "Command validation failed".into(),
        detail: Some("targetTemperatureC above maximum".into()),
    }));
    let mut session = active_session(&service).await;

    let Reply::Command(report) = session.handle_line(Some(r#"{"targetTemperatureC": 500}"#)).await
    else {
        panic!("expected a command reply");
    };
    assert_eq!(report.notes.len(), 1);
    assert_eq!(
        report.notes[0].to_string(),
        "targetTemperatureC: 500 is above the declared maximum 250"
    );
    match report.outcome.unwrap() {
        CommandResult::Rejected {
            error_code, detail, ..
        } => {
            assert_eq!(error_code, "COMMAND_VALIDATION_ERROR");
            assert_eq!(detail.as_deref(), Some("targetTemperatureC above maximum"));
        }
        other @ CommandResult::Accepted { .. } => panic!("expected rejection, got {other:?}"),
    }
    assert!(
        service
            .calls()
            .contains(&format!(r#"command {OVEN_ID} {{"targetTemperatureC":500}}"#))
    );
}

#[tokio::test]
async fn malformed_json_makes_no_call() {
    let service = FakeService::oven();
    let mut session = active_session(&service).await;
    let before = service.calls().len();

    let reply = session.handle_line(Some(r#"{"cavityLight": }"#)).await;
    assert!(matches!(reply, Reply::ParseError(CoreError::Parse { .. })), "{reply:?}");
    let reply = session.handle_line(Some("[true]")).await;
    assert!(matches!(reply, Reply::ParseError(_)), "{reply:?}");

    assert_eq!(commands(&session), 0);
    assert_eq!(service.calls().len(), before);
    assert_eq!(session.state(), SessionState::AwaitingInput);
}

#[tokio::test]
async fn quit_terminates() {
    let service = FakeService::oven();
    let mut session = active_session(&service).await;

    assert!(matches!(session.handle_line(Some("QUIT")).await, Reply::Quit));
    assert_eq!(session.state(), SessionState::Terminated);
    assert!(matches!(
        session.handle_line(Some(r#"{"cavityLight": true}"#)).await,
        Reply::Quit
    ));
}

// ── Loop properties ─────────────────────────────────────────────────

#[tokio::test]
async fn end_of_input_terminates() {
    let service = FakeService::oven();
    let mut session = active_session(&service).await;
    assert!(matches!(session.handle_line(None).await, Reply::Quit));
    assert_eq!(session.state(), SessionState::Terminated);
}

#[tokio::test]
async fn counter_only_moves_for_parsed_commands() {
    let service = FakeService::oven();
    let mut session = active_session(&service).await;

    let inputs = ["", "help", "h", "s", "{}", "not json", r#"{"cavityLight": false}"#, "   "];
    let mut replies = 0;
    for input in inputs {
        let reply = session.handle_line(Some(input)).await;
        if let Reply::Command(report) = reply {
            replies += 1;
            assert_eq!(report.seq, replies);
        }
    }
    assert_eq!(replies, 2);
    assert_eq!(commands(&session), 2);
}

#[tokio::test]
async fn transport_failure_is_reported_inline() {
    let service = FakeService::oven();
    service.queue(Err(CoreError::Timeout));
    let mut session = active_session(&service).await;

    let Reply::Command(report) = session.handle_line(Some(r#"{"cavityLight": true}"#)).await else {
        panic!("expected a command reply");
    };
    let err = report.outcome.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(err.retry_hint().as_deref(), Some("re-enter the command to retry"));
    assert_eq!(session.state(), SessionState::AwaitingInput);
}

#[tokio::test]
async fn state_after_accepted_command() {
    let service = FakeService::oven();
    let mut session = Session::new(&service).with_options(SessionOptions { state_after: true });
    session.load_directory().await.unwrap();
    session.select(OVEN_ID).unwrap();
    session.activate().await.unwrap();

    let Reply::Command(report) = session.handle_line(Some(r#"{"cavityLight": true}"#)).await else {
        panic!("expected a command reply");
    };
    assert!(report.state_after.is_some());
}

#[tokio::test]
async fn unknown_appliance_is_fatal_at_activation() {
    let mut service = FakeService::oven();
    service.details_answer = Answer::NotFound;
    let mut session = Session::new(&service);
    session.load_directory().await.unwrap();
    session.select("1").unwrap();

    let err = session.activate().await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }), "{err:?}");
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.context().is_none());
}

#[tokio::test]
async fn info_failure_at_activation_leaves_catalog_empty() {
    let mut service = FakeService::oven();
    service.details_answer = Answer::Timeout;
    let mut session = active_session(&service).await;

    assert_eq!(session.state(), SessionState::SessionActive);
    let ctx = session.context().unwrap();
    assert!(ctx.catalog.is_empty());
    assert_eq!(ctx.info.brand(), "Electrolux");
    assert_eq!(ctx.appliance.resolved_model, "944188772");

    // Commands still go out without a catalog to check against.
    let Reply::Command(report) = session.handle_line(Some(r#"{"targetTemperatureC": 500}"#)).await
    else {
        panic!("expected a command reply");
    };
    assert!(report.outcome.is_ok());
}

#[tokio::test]
async fn initial_state_failure_still_activates() {
    let mut service = FakeService::oven();
    service.state_answer = Answer::Timeout;
    let mut session = Session::new(&service);
    session.load_directory().await.unwrap();
    session.select("1").unwrap();

    let initial = session.activate().await.unwrap();
    assert!(initial.is_none());
    assert_eq!(session.state(), SessionState::SessionActive);
    assert_eq!(session.context().unwrap().catalog.len(), 2);
}

#[tokio::test]
async fn state_directive_failure_is_reported_inline() {
    let mut service = FakeService::oven();
    service.state_answer = Answer::Timeout;
    let mut session = active_session(&service).await;

    let reply = session.handle_line(Some("state")).await;
    assert!(matches!(reply, Reply::Failure(CoreError::Timeout)), "{reply:?}");
    assert_eq!(session.state(), SessionState::AwaitingInput);
    assert_eq!(commands(&session), 0);

    assert!(matches!(session.handle_line(Some("help")).await, Reply::Help));
}

#[tokio::test]
async fn info_model_replaces_listing_model() {
    let mut service = FakeService::oven();
    service.info = json!({ "brand": "AEG", "model": "914501128_EHE6899SA" });
    let session = active_session(&service).await;

    let ctx = session.context().unwrap();
    assert_eq!(ctx.appliance.resolved_model, "914501128_EHE6899SA");
    assert_eq!(ctx.info.brand(), "AEG");
}

#[tokio::test]
async fn empty_directory_is_an_error() {
    let mut service = FakeService::oven();
    service.listing = json!([]);
    let mut session = Session::new(&service);
    let err = session.load_directory().await.unwrap_err();
    assert!(matches!(err, CoreError::EmptyDirectory));
}

// ── Export ──────────────────────────────────────────────────────────

#[tokio::test]
async fn export_writes_named_artifact_and_overwrites() {
    let service = FakeService::oven();
    let mut session = Session::new(&service);
    let record = session.load_directory().await.unwrap().get(0).unwrap().clone();
    let dir = tempfile::tempdir().unwrap();

    let path = export_appliance(&service, &record, dir.path()).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "944188772.txt");
    std::fs::write(&path, "stale").unwrap();

    let again = export_appliance(&service, &record, dir.path()).await.unwrap();
    assert_eq!(again, path);
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("Appliance: My Oven\n"));
    assert!(text.contains("Capabilities: 2 (2 writable)"));
    let state_at = text.find(STATE_MARKER).unwrap();
    let caps_at = text.find(CAPABILITIES_MARKER).unwrap();
    assert!(state_at < caps_at);
    assert!(text[state_at..caps_at].contains("\"applianceState\": \"IDLE\""));
    assert!(text[caps_at..].contains("\"targetTemperatureC\""));
}

#[tokio::test]
async fn export_survives_info_failure() {
    let mut service = FakeService::oven();
    service.details_answer = Answer::Timeout;
    let mut session = Session::new(&service);
    let record = session.load_directory().await.unwrap().get(0).unwrap().clone();
    let dir = tempfile::tempdir().unwrap();

    let path = export_appliance(&service, &record, dir.path()).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "944188772.txt");
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Brand: Electrolux\n"));
    assert!(text.contains("Capabilities: none reported\n"));
    assert!(text.ends_with(&format!("{CAPABILITIES_MARKER}\n{{}}\n")));
}

#[tokio::test]
async fn export_of_unknown_appliance_fails() {
    let mut service = FakeService::oven();
    service.details_answer = Answer::NotFound;
    let mut session = Session::new(&service);
    let record = session.load_directory().await.unwrap().get(0).unwrap().clone();
    let dir = tempfile::tempdir().unwrap();

    let err = export_appliance(&service, &record, dir.path()).await.unwrap_err();
    assert!(matches!(err, CoreError::NotFound { .. }), "{err:?}");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn export_names_file_after_info_model() {
    let mut service = FakeService::oven();
    service.info = json!({ "brand": "AEG", "model": "914501128_123456_EHE6899SA" });
    let mut session = Session::new(&service);
    let record = session.load_directory().await.unwrap().get(0).unwrap().clone();
    let dir = tempfile::tempdir().unwrap();

    let path = export_appliance(&service, &record, dir.path()).await.unwrap();
    assert_eq!(path.file_name().unwrap(), "EHE6899SA.txt");
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Brand: AEG\nModel: 914501128_123456_EHE6899SA\n"), "{text}");
}
