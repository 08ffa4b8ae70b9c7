use tracing::{info, warn};

use crate::client::SignupTransport;
use crate::form::{FormError, SignupForm, SignupRecord};
use crate::WaitlistError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignupStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("a submission is already in flight")]
    Busy,
    #[error(transparent)]
    Delivery(#[from] WaitlistError),
}

type SuccessHook = Box<dyn FnMut() + Send>;

/// One open signup dialog: the form, its submission status and a hook fired
/// after each successful delivery.
#[derive(Default)]
pub struct SignupSession {
    pub form: SignupForm,
    status: SignupStatus,
    on_success: Option<SuccessHook>,
}

impl std::fmt::Debug for SignupSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupSession")
            .field("form", &self.form)
            .field("status", &self.status)
            .field("on_success", &self.on_success.is_some())
            .finish()
    }
}

impl SignupSession {
    pub fn new(form: SignupForm) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    pub fn with_on_success(mut self, hook: impl FnMut() + Send + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    pub fn status(&self) -> SignupStatus {
        self.status
    }

    /// Validates the form and moves to `Loading`. Nothing changes when the
    /// form is invalid or a submission is already running.
    pub fn begin_submit(&mut self) -> Result<SignupRecord, SubmitError> {
        if self.status == SignupStatus::Loading {
            return Err(SubmitError::Busy);
        }
        let record = self.form.validate()?;
        self.status = SignupStatus::Loading;
        Ok(record)
    }

    /// Records the outcome of a submission started with [`begin_submit`].
    ///
    /// [`begin_submit`]: Self::begin_submit
    pub fn finish(&mut self, result: Result<(), WaitlistError>) -> Result<(), WaitlistError> {
        match result {
            Ok(()) => {
                info!("waitlist signup succeeded");
                self.status = SignupStatus::Success;
                if let Some(hook) = self.on_success.as_mut() {
                    hook();
                }
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "waitlist signup failed");
                self.status = SignupStatus::Error;
                Err(err)
            }
        }
    }

    pub fn submit<T: SignupTransport>(&mut self, transport: &T) -> Result<(), SubmitError> {
        let record = self.begin_submit()?;
        let outcome = transport.submit(&record);
        self.finish(outcome)?;
        Ok(())
    }

    /// Closing the dialog clears the form and status.
    pub fn close(&mut self) {
        self.form.reset();
        self.status = SignupStatus::Idle;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::counter::WaitlistCounter;

    #[derive(Default)]
    struct RecordingTransport {
        sent: RefCell<Vec<SignupRecord>>,
        fail: bool,
    }

    impl SignupTransport for RecordingTransport {
        fn submit(&self, record: &SignupRecord) -> Result<(), WaitlistError> {
            self.sent.borrow_mut().push(record.clone());
            if self.fail {
                Err(WaitlistError::MissingEndpoint)
            } else {
                Ok(())
            }
        }
    }

    fn valid_form() -> SignupForm {
        SignupForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "a@b.c".into(),
            phone: "1234567".into(),
            ..SignupForm::default()
        }
    }

    #[test]
    fn valid_submission_sends_one_request() {
        let transport = RecordingTransport::default();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let mut session = SignupSession::new(valid_form()).with_on_success(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        session.submit(&transport).unwrap();

        let sent = transport.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].phone, "+11234567");
        assert_eq!(session.status(), SignupStatus::Success);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn invalid_form_sends_nothing() {
        let transport = RecordingTransport::default();
        let mut session = SignupSession::new(SignupForm {
            email: "nope".into(),
            ..valid_form()
        });

        assert!(matches!(
            session.submit(&transport),
            Err(SubmitError::Form(FormError::InvalidEmail(_)))
        ));
        assert!(transport.sent.borrow().is_empty());
        assert_eq!(session.status(), SignupStatus::Idle);
    }

    #[test]
    fn loading_blocks_overlapping_submissions() {
        let mut session = SignupSession::new(valid_form());
        session.begin_submit().unwrap();
        assert_eq!(session.status(), SignupStatus::Loading);
        assert!(matches!(session.begin_submit(), Err(SubmitError::Busy)));

        session.finish(Ok(())).unwrap();
        assert_eq!(session.status(), SignupStatus::Success);
    }

    #[test]
    fn failure_keeps_form_values() {
        let transport = RecordingTransport {
            fail: true,
            ..RecordingTransport::default()
        };
        let mut session = SignupSession::new(valid_form());

        assert!(matches!(
            session.submit(&transport),
            Err(SubmitError::Delivery(WaitlistError::MissingEndpoint))
        ));
        assert_eq!(session.status(), SignupStatus::Error);
        assert_eq!(session.form, valid_form());

        // Retrying is allowed once the previous attempt has finished.
        assert!(session.begin_submit().is_ok());
    }

    #[test]
    fn success_hook_counts_the_signup_once() {
        let mut seeded = WaitlistCounter::new(0);
        seeded.apply_fetch(Ok(41));
        let counter = Arc::new(Mutex::new(seeded));
        let on_success = Arc::clone(&counter);
        let mut session = SignupSession::new(valid_form()).with_on_success(move || {
            on_success.lock().unwrap().record_signup();
        });

        let failing = RecordingTransport {
            fail: true,
            ..RecordingTransport::default()
        };
        assert!(session.submit(&failing).is_err());
        assert_eq!(counter.lock().unwrap().display_count(), Some(41));

        session.submit(&RecordingTransport::default()).unwrap();
        assert_eq!(counter.lock().unwrap().display_count(), Some(42));
    }

    #[test]
    fn close_resets_form_and_status() {
        let mut session = SignupSession::new(valid_form());
        session.finish(Ok(())).unwrap();
        session.close();
        assert_eq!(session.status(), SignupStatus::Idle);
        assert_eq!(session.form, SignupForm::default());
    }
}
