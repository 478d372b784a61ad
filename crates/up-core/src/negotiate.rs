//! User negotiation state machine.
//!
//! One pass per call: `Idle → Presenting → {Resolved | TimedOut}`. The
//! presenting state spawns the external dialog through the
//! [`DialogPresenter`](crate::host::DialogPresenter) seam under a
//! supervisory wall-clock bound, so negotiation always makes forward
//! progress. The resolved raw signal is decoded through an explicit mapping
//! with a `Declined` default arm; only exactly matched combinations may
//! proceed or defer.

use crate::host::DialogPresenter;
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};
use up_common::{NegotiationOutcome, Result, UpdateTarget};
use up_config::Settings;

/// Signal value the dialog reports when closed without a choice.
pub const CLOSED_SIGNAL: u64 = 239;

/// Which message the dialog presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    /// Deferral menu offered, with the remaining budget in the text.
    Deferrable { remaining: u32 },
    /// Budget exhausted; any button is acceptance.
    Exhausted,
    /// Emergency patch; the outcome is ignored by the caller.
    Forced,
}

/// A fully built dialog invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DialogRequest {
    pub title: String,
    pub icon: PathBuf,
    pub description: String,
    /// Deferral menu to offer, when deferral is available.
    pub show_delay_options: Option<Vec<u64>>,
    pub cancel_button: bool,
    pub default_accept: bool,
    /// The dialog's own response timeout, where one applies (reopen offer).
    pub response_timeout_secs: Option<u64>,
}

/// What came back from the dialog subprocess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogSignal {
    /// The process returned; payload is its trimmed raw output.
    Resolved(String),
    /// The process outlived the supervisory bound and was killed.
    TimedOut,
}

/// Whether the user wants the app reopened after the update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReopenChoice {
    Reopen,
    Dismiss,
}

/// Decode a resolved raw dialog signal.
///
/// The signal encodes two parts: the last digit is the button pressed, the
/// leading digits (if any) the deferral duration in seconds chosen from the
/// fixed menu. A 10-minute deferral confirmed with button 1 therefore
/// arrives as `6001`.
///
/// Mapping, in order:
/// - `always_proceed` (forced or exhausted prompt): `Proceed`, any signal.
/// - empty: `Dismissed` (closed without choice).
/// - non-numeric: `Unparseable`.
/// - the closed signal (239): `Dismissed`.
/// - `0` / `1` (accept-now, zero-duration confirm): `Proceed`.
/// - button 1 with a duration from the menu: `Defer`.
/// - default arm: `Declined`. Nothing else may proceed.
pub fn decode_signal(raw: &str, always_proceed: bool, menu: &[u64]) -> NegotiationOutcome {
    if always_proceed {
        return NegotiationOutcome::Proceed;
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return NegotiationOutcome::Dismissed;
    }
    let signal: u64 = match trimmed.parse() {
        Ok(signal) => signal,
        Err(_) => return NegotiationOutcome::Unparseable,
    };
    if signal == CLOSED_SIGNAL {
        return NegotiationOutcome::Dismissed;
    }
    if signal == 0 || signal == 1 {
        return NegotiationOutcome::Proceed;
    }
    let button = signal % 10;
    let secs = signal / 10;
    if button == 1 && secs > 0 && menu.contains(&secs) {
        return NegotiationOutcome::Defer { secs };
    }
    NegotiationOutcome::Declined
}

/// Runs one negotiation with the user.
pub struct Negotiator<'a> {
    presenter: &'a dyn DialogPresenter,
    settings: &'a Settings,
}

impl<'a> Negotiator<'a> {
    pub fn new(presenter: &'a dyn DialogPresenter, settings: &'a Settings) -> Self {
        Negotiator {
            presenter,
            settings,
        }
    }

    fn icon(&self) -> PathBuf {
        if self.settings.icon_path.exists() {
            self.settings.icon_path.clone()
        } else {
            self.settings.fallback_icon_path.clone()
        }
    }

    /// Build the request for an update prompt.
    pub fn build_request(&self, target: &UpdateTarget, variant: PromptVariant) -> DialogRequest {
        let org = &self.settings.org_name;
        let app = &target.display_name;
        let (description, menu) = match variant {
            PromptVariant::Deferrable { remaining } => (
                deferrable_description(app, org, remaining),
                Some(self.settings.defer_menu.clone()),
            ),
            PromptVariant::Exhausted => (exhausted_description(app, org), None),
            PromptVariant::Forced => (forced_description(app, org), None),
        };
        DialogRequest {
            title: "Managed App Update".to_string(),
            icon: self.icon(),
            description,
            show_delay_options: menu,
            cancel_button: false,
            default_accept: false,
            response_timeout_secs: None,
        }
    }

    /// Present the prompt and decode the outcome.
    pub fn negotiate(
        &self,
        target: &UpdateTarget,
        variant: PromptVariant,
    ) -> Result<NegotiationOutcome> {
        let request = self.build_request(target, variant);
        debug!(app = %target.display_name, ?variant, "presenting update prompt");
        let signal = self.presenter.present(&request)?;
        let outcome = match signal {
            DialogSignal::Resolved(raw) => decode_signal(
                &raw,
                matches!(variant, PromptVariant::Forced | PromptVariant::Exhausted),
                &self.settings.defer_menu,
            ),
            // Forced updates ignore every prompt outcome, timeout included.
            DialogSignal::TimedOut if matches!(variant, PromptVariant::Forced) => {
                NegotiationOutcome::Proceed
            }
            DialogSignal::TimedOut => NegotiationOutcome::TimedOut,
        };
        info!(app = %target.display_name, ?outcome, "negotiation resolved");
        Ok(outcome)
    }

    /// Present the completion message with a reopen offer.
    ///
    /// Runs with its own response timeout and a default-accept button, so
    /// walking away resolves to reopening the app.
    pub fn offer_reopen(&self, target: &UpdateTarget) -> Result<ReopenChoice> {
        let request = DialogRequest {
            title: "Managed App Update".to_string(),
            icon: self.icon(),
            description: completion_description(&target.display_name),
            show_delay_options: None,
            cancel_button: true,
            default_accept: true,
            response_timeout_secs: Some(self.settings.reopen_timeout_secs),
        };
        let choice = match self.presenter.present(&request)? {
            DialogSignal::Resolved(raw) => match raw.trim().parse::<u64>() {
                Ok(0) => ReopenChoice::Reopen,
                _ => ReopenChoice::Dismiss,
            },
            DialogSignal::TimedOut => ReopenChoice::Dismiss,
        };
        Ok(choice)
    }
}

fn deferrable_description(app: &str, org: &str, remaining: u32) -> String {
    format!(
        "Hello!\n\n\
         {org} IT would like to patch {app}. Click OK to continue; this will \
         quit the application, so please save your work first. We'll let you \
         know when the update is finished.\n\n\
         If you'd prefer to update later, select a deferral time below, or \
         defer now and use the {org} Self Service app to update at your \
         convenience.\n\n\
         You may defer this update up to {remaining} more time(s).\n\n\
         {org} IT\n"
    )
}

fn exhausted_description(app: &str, org: &str) -> String {
    format!(
        "Hello!\n\n\
         {org} IT would like to patch {app}. Click OK to continue; this will \
         quit the application, so please save your work first.\n\n\
         Deferral is not available. {app} will be closed and updated. We'll \
         let you know when the update is finished.\n\n\
         {org} IT\n"
    )
}

fn forced_description(app: &str, org: &str) -> String {
    format!(
        "Hello!\n\n\
         {org} IT would like to patch {app}. This is an emergency patch and \
         the application will be quit to deploy security fixes.\n\n\
         {org} IT\n"
    )
}

fn completion_description(app: &str) -> String {
    format!(
        "Thank you!\n\n\
         {app} has been updated successfully. Do you want to reopen it?\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use up_common::UpdateId;

    const MENU: [u64; 7] = [0, 600, 1200, 3600, 10_800, 86_400, 172_800];

    #[test]
    fn ten_minute_deferral_decodes() {
        assert_eq!(
            decode_signal("6001", false, &MENU),
            NegotiationOutcome::Defer { secs: 600 }
        );
    }

    #[test]
    fn every_menu_duration_crossed_with_both_buttons() {
        for &secs in &MENU {
            let confirm = format!("{secs}1");
            let cancel = format!("{secs}2");
            let expected_confirm = if secs == 0 {
                // "01" parses to 1: zero-duration confirm is accept-now.
                NegotiationOutcome::Proceed
            } else {
                NegotiationOutcome::Defer { secs }
            };
            assert_eq!(decode_signal(&confirm, false, &MENU), expected_confirm);
            assert_eq!(
                decode_signal(&cancel, false, &MENU),
                NegotiationOutcome::Declined
            );
        }
    }

    #[test]
    fn accept_now_decodes_to_proceed() {
        assert_eq!(decode_signal("0", false, &MENU), NegotiationOutcome::Proceed);
        assert_eq!(decode_signal("1", false, &MENU), NegotiationOutcome::Proceed);
    }

    #[test]
    fn empty_and_closed_signals_are_dismissed() {
        assert_eq!(decode_signal("", false, &MENU), NegotiationOutcome::Dismissed);
        assert_eq!(
            decode_signal("  ", false, &MENU),
            NegotiationOutcome::Dismissed
        );
        assert_eq!(
            decode_signal("239", false, &MENU),
            NegotiationOutcome::Dismissed
        );
    }

    #[test]
    fn garbage_is_unparseable() {
        assert_eq!(
            decode_signal("not-a-code", false, &MENU),
            NegotiationOutcome::Unparseable
        );
        assert_eq!(
            decode_signal("-5", false, &MENU),
            NegotiationOutcome::Unparseable
        );
    }

    #[test]
    fn off_menu_duration_falls_to_declined() {
        // Button 1 with a duration the menu never offered.
        assert_eq!(
            decode_signal("71", false, &MENU),
            NegotiationOutcome::Declined
        );
    }

    #[test]
    fn forced_and_exhausted_prompts_always_proceed() {
        for raw in ["", "239", "6002", "garbage", "1728002"] {
            assert_eq!(
                decode_signal(raw, true, &MENU),
                NegotiationOutcome::Proceed
            );
        }
    }

    struct ScriptedPresenter {
        signal: DialogSignal,
    }

    impl DialogPresenter for ScriptedPresenter {
        fn present(&self, _request: &DialogRequest) -> Result<DialogSignal> {
            Ok(self.signal.clone())
        }
    }

    fn settings() -> Settings {
        Settings::with_state_dir("/tmp/up-test")
    }

    fn target() -> UpdateTarget {
        UpdateTarget {
            id: UpdateId::new("com.example.app"),
            display_name: "Example".into(),
            force_requested: false,
            allow_prompt: true,
        }
    }

    #[test]
    fn deferrable_request_carries_menu_and_counts() {
        let settings = settings();
        let presenter = ScriptedPresenter {
            signal: DialogSignal::Resolved("0".into()),
        };
        let negotiator = Negotiator::new(&presenter, &settings);
        let request =
            negotiator.build_request(&target(), PromptVariant::Deferrable { remaining: 4 });

        assert_eq!(request.show_delay_options.as_deref(), Some(&MENU[..]));
        assert!(request.description.contains("Example"));
        assert!(request.description.contains(&settings.org_name));
        assert!(request.description.contains("4 more time(s)"));
        assert!(request.response_timeout_secs.is_none());
    }

    #[test]
    fn exhausted_request_offers_no_menu() {
        let settings = settings();
        let presenter = ScriptedPresenter {
            signal: DialogSignal::Resolved("0".into()),
        };
        let negotiator = Negotiator::new(&presenter, &settings);
        let request = negotiator.build_request(&target(), PromptVariant::Exhausted);

        assert!(request.show_delay_options.is_none());
        assert!(request.description.contains("Deferral is not available"));
    }

    #[test]
    fn timeout_is_timed_out_unless_forced() {
        let settings = settings();
        let presenter = ScriptedPresenter {
            signal: DialogSignal::TimedOut,
        };
        let negotiator = Negotiator::new(&presenter, &settings);

        let outcome = negotiator
            .negotiate(&target(), PromptVariant::Deferrable { remaining: 1 })
            .unwrap();
        assert_eq!(outcome, NegotiationOutcome::TimedOut);

        let outcome = negotiator
            .negotiate(&target(), PromptVariant::Forced)
            .unwrap();
        assert_eq!(outcome, NegotiationOutcome::Proceed);
    }

    #[test]
    fn reopen_offer_decodes_default_accept() {
        let settings = settings();
        let presenter = ScriptedPresenter {
            signal: DialogSignal::Resolved("0".into()),
        };
        let negotiator = Negotiator::new(&presenter, &settings);
        assert_eq!(
            negotiator.offer_reopen(&target()).unwrap(),
            ReopenChoice::Reopen
        );

        let presenter = ScriptedPresenter {
            signal: DialogSignal::Resolved("2".into()),
        };
        let negotiator = Negotiator::new(&presenter, &settings);
        assert_eq!(
            negotiator.offer_reopen(&target()).unwrap(),
            ReopenChoice::Dismiss
        );
    }
}
