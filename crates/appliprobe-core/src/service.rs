// ── Service seam ──
//
// The four remote operations the session and exporter consume. The real
// implementation is `ApplianceClient`; tests substitute an in-memory fake.

use std::future::Future;

use appliprobe_api::ApplianceClient;
use appliprobe_api::types::ApplianceSummary;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{ApplianceDetails, CommandRequest, CommandResult, StateSnapshot};

/// Remote operations against the appliance service.
pub trait ApplianceService {
    /// Every appliance on the account, in service order.
    fn list_appliances(&self) -> impl Future<Output = Result<Vec<ApplianceSummary>, CoreError>> + Send;

    /// Current reported state of one appliance.
    fn get_state(
        &self,
        appliance_id: &str,
    ) -> impl Future<Output = Result<StateSnapshot, CoreError>> + Send;

    /// Static info and capability catalog of one appliance.
    fn get_details(
        &self,
        appliance_id: &str,
    ) -> impl Future<Output = Result<ApplianceDetails, CoreError>> + Send;

    /// Submit one command.
    ///
    /// A service verdict on the command (accept or reject) is `Ok`; `Err`
    /// means no verdict was obtained.
    fn execute_command(
        &self,
        appliance_id: &str,
        request: &CommandRequest,
    ) -> impl Future<Output = Result<CommandResult, CoreError>> + Send;
}

impl ApplianceService for ApplianceClient {
    async fn list_appliances(&self) -> Result<Vec<ApplianceSummary>, CoreError> {
        Ok(ApplianceClient::list_appliances(self).await?)
    }

    async fn get_state(&self, appliance_id: &str) -> Result<StateSnapshot, CoreError> {
        self.get_appliance_state(appliance_id)
            .await
            .map(StateSnapshot::new)
            .map_err(|e| appliance_error(e, appliance_id))
    }

    async fn get_details(&self, appliance_id: &str) -> Result<ApplianceDetails, CoreError> {
        self.get_appliance_info(appliance_id)
            .await
            .map(|r| ApplianceDetails::from_parts(r.appliance_info, r.capabilities))
            .map_err(|e| appliance_error(e, appliance_id))
    }

    async fn execute_command(
        &self,
        appliance_id: &str,
        request: &CommandRequest,
    ) -> Result<CommandResult, CoreError> {
        match ApplianceClient::execute_command(self, appliance_id, &request.to_json()).await {
            Ok(body) => Ok(CommandResult::from_response_body(body)),
            Err(appliprobe_api::Error::Api {
                status,
                code,
                message,
                detail,
            }) if is_verdict(status) => {
                debug!(status, ?code, "command rejected by service");
                Ok(CommandResult::Rejected {
                    error_code: code.unwrap_or_else(|| format!("HTTP_{status}")),
                    message,
                    detail,
                })
            }
            Err(e) => Err(appliance_error(e, appliance_id)),
        }
    }
}

/// Client errors that carry the service's judgement of the command itself.
fn is_verdict(status: u16) -> bool {
    (400..500).contains(&status) && status != 408
}

fn appliance_error(err: appliprobe_api::Error, appliance_id: &str) -> CoreError {
    if err.is_not_found() {
        CoreError::NotFound {
            entity_type: "Appliance".into(),
            identifier: appliance_id.to_owned(),
        }
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_statuses() {
        assert!(is_verdict(400));
        assert!(is_verdict(406));
        assert!(is_verdict(422));
        assert!(!is_verdict(408));
        assert!(!is_verdict(500));
        assert!(!is_verdict(503));
    }

    #[test]
    fn not_found_names_the_appliance() {
        let err = appliance_error(
            appliprobe_api::Error::NotFound {
                path: "/api/v1/appliances/x/info".into(),
            },
            "x",
        );
        assert_eq!(err.to_string(), "Appliance not found: x");
    }
}
