use tokio::sync::mpsc;

use super::api::{RegistryApi, UploadSource};
use super::phase::MintPhase;
use super::{MintWallet, WorkflowError};
use crate::models::{MintConfirmationRequest, MintConfirmationResponse};

/// Drives one upload-and-mint attempt from start to finish.
///
/// Construction hands back the phase receiver; every transition is
/// published to it as it happens. The receiver may be dropped at any
/// point without stalling the run.
pub struct MintRunner<A, W> {
    api: A,
    wallet: W,
    recipient: String,
    phase_tx: mpsc::UnboundedSender<MintPhase>,
}

impl<A: RegistryApi, W: MintWallet> MintRunner<A, W> {
    pub fn new(
        api: A,
        wallet: W,
        recipient: &str,
    ) -> (Self, mpsc::UnboundedReceiver<MintPhase>) {
        let (phase_tx, phase_rx) = mpsc::unbounded_channel();
        (
            Self {
                api,
                wallet,
                recipient: recipient.to_string(),
                phase_tx,
            },
            phase_rx,
        )
    }

    /// Run the whole workflow; the returned result mirrors the terminal phase.
    pub async fn run(
        &self,
        source: UploadSource,
    ) -> Result<MintConfirmationResponse, WorkflowError> {
        match self.drive(&source).await {
            Ok(outcome) => {
                self.publish(MintPhase::Succeeded {
                    outcome: outcome.clone(),
                });
                Ok(outcome)
            }
            Err(err) => {
                self.publish(MintPhase::Failed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        source: &UploadSource,
    ) -> Result<MintConfirmationResponse, WorkflowError> {
        self.publish(MintPhase::CheckingLimits);
        let usage = self.api.usage().await?;
        // Advisory only; the server re-checks before pinning anything.
        if let Some(reason) = usage.over_limit_reason(source.bytes.len() as i64) {
            return Err(WorkflowError::Quota(reason));
        }

        self.publish(MintPhase::UploadingFile {
            filename: source.filename.clone(),
        });
        self.publish(MintPhase::PreparingMetadata {
            filename: source.filename.clone(),
        });
        let prepared = self.api.prepare_mint(source).await?;

        self.publish(MintPhase::WaitingForSignature {
            token_uri: prepared.token_uri.clone(),
        });
        let tx_hash = self
            .wallet
            .submit_mint(&self.recipient, &prepared.token_uri)
            .await?;

        self.publish(MintPhase::Minting {
            tx_hash: tx_hash.clone(),
        });
        let minted = self.wallet.wait_for_mint(&tx_hash).await?;
        tracing::debug!("Token {} minted to {}", minted.token_id, minted.recipient);

        self.publish(MintPhase::ConfirmingBackend {
            tx_hash: tx_hash.clone(),
            token_id: minted.token_id.clone(),
        });
        let metadata_cid = prepared
            .token_uri
            .strip_prefix("ipfs://")
            .unwrap_or(&prepared.token_uri)
            .to_string();
        let confirmation = MintConfirmationRequest {
            tx_hash,
            token_id: minted.token_id,
            file_hash: prepared.file_hash,
            file_cid: prepared.file_cid,
            metadata_cid,
            original_filename: prepared.original_filename,
            mime_type: source.mime_type.clone(),
            size_bytes: source.bytes.len() as i64,
        };
        self.api.confirm_mint(&confirmation).await
    }

    fn publish(&self, phase: MintPhase) {
        let _ = self.phase_tx.send(phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PrepareMintResponse, UsageLimits, UsageResponse};
    use crate::workflow::MintedToken;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::mem::discriminant;
    use std::sync::Mutex;

    struct FakeApi {
        usage: UsageResponse,
        fail_prepare: bool,
        confirmed: Mutex<Option<MintConfirmationRequest>>,
    }

    impl FakeApi {
        fn new() -> Self {
            Self {
                usage: usage_at(0, 0),
                fail_prepare: false,
                confirmed: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl RegistryApi for FakeApi {
        async fn usage(&self) -> Result<UsageResponse, WorkflowError> {
            Ok(self.usage.clone())
        }

        async fn prepare_mint(
            &self,
            source: &UploadSource,
        ) -> Result<PrepareMintResponse, WorkflowError> {
            if self.fail_prepare {
                return Err(WorkflowError::Api(
                    "Failed to upload file to IPFS.".to_string(),
                ));
            }
            Ok(PrepareMintResponse {
                message: "File uploaded and metadata prepared for minting.".to_string(),
                token_uri: "ipfs://QmMetaFake".to_string(),
                file_hash: "7509e5bda0c762d2bac7f90d758b5b2263fa01ccbc542ab5e3df163be08e6ca9"
                    .to_string(),
                file_cid: "QmFileFake".to_string(),
                original_filename: source.filename.clone(),
            })
        }

        async fn confirm_mint(
            &self,
            req: &MintConfirmationRequest,
        ) -> Result<MintConfirmationResponse, WorkflowError> {
            *self.confirmed.lock().unwrap() = Some(req.clone());
            Ok(MintConfirmationResponse {
                message: "Minting confirmed and records saved successfully.".to_string(),
                file_record_id: "file-1".to_string(),
                ip_record_id: "rec-1".to_string(),
                token_id: req.token_id.clone(),
                tx_hash: req.tx_hash.clone(),
            })
        }
    }

    struct FakeWallet {
        reject_signature: bool,
        missing_event: bool,
        submitted: Mutex<Option<(String, String)>>,
    }

    impl FakeWallet {
        fn new() -> Self {
            Self {
                reject_signature: false,
                missing_event: false,
                submitted: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl MintWallet for FakeWallet {
        async fn submit_mint(
            &self,
            recipient: &str,
            token_uri: &str,
        ) -> Result<String, WorkflowError> {
            if self.reject_signature {
                return Err(WorkflowError::Wallet("user rejected request".to_string()));
            }
            *self.submitted.lock().unwrap() =
                Some((recipient.to_string(), token_uri.to_string()));
            Ok("0x2ef1e2bdc5eb1d6b2f7e9a1c3d4f5a6b7c8d9e0f".to_string())
        }

        async fn wait_for_mint(&self, _tx_hash: &str) -> Result<MintedToken, WorkflowError> {
            if self.missing_event {
                return Err(WorkflowError::MissingMintEvent);
            }
            Ok(MintedToken {
                token_id: "7".to_string(),
                recipient: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266".to_string(),
            })
        }
    }

    fn usage_at(records: i64, bytes: i64) -> UsageResponse {
        UsageResponse {
            record_count: records,
            storage_used_bytes: bytes,
            tier: "free".to_string(),
            limits: UsageLimits {
                free_record_limit: 5,
                free_storage_limit_bytes: 100 * 1024 * 1024,
            },
        }
    }

    fn source() -> UploadSource {
        UploadSource {
            bytes: Bytes::from_static(b"hello world!"),
            filename: "design.png".to_string(),
            mime_type: "image/png".to_string(),
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<MintPhase>) -> Vec<MintPhase> {
        let mut phases = Vec::new();
        while let Ok(phase) = rx.try_recv() {
            phases.push(phase);
        }
        phases
    }

    fn shapes(phases: &[MintPhase]) -> Vec<std::mem::Discriminant<MintPhase>> {
        phases.iter().map(discriminant).collect()
    }

    #[tokio::test]
    async fn happy_path_walks_every_phase_in_order() {
        let (runner, mut rx) = MintRunner::new(
            FakeApi::new(),
            FakeWallet::new(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        );

        let outcome = runner.run(source()).await.unwrap();
        assert_eq!(outcome.token_id, "7");
        assert_eq!(outcome.ip_record_id, "rec-1");

        let phases = drain(&mut rx);
        let expected = [
            MintPhase::CheckingLimits,
            MintPhase::UploadingFile {
                filename: String::new(),
            },
            MintPhase::PreparingMetadata {
                filename: String::new(),
            },
            MintPhase::WaitingForSignature {
                token_uri: String::new(),
            },
            MintPhase::Minting {
                tx_hash: String::new(),
            },
            MintPhase::ConfirmingBackend {
                tx_hash: String::new(),
                token_id: String::new(),
            },
            MintPhase::Succeeded {
                outcome: outcome.clone(),
            },
        ];
        assert_eq!(shapes(&phases), shapes(&expected));
        assert_eq!(phases.last(), Some(&expected[6]));
        assert!(matches!(
            &phases[3],
            MintPhase::WaitingForSignature { token_uri } if token_uri == "ipfs://QmMetaFake"
        ));
    }

    #[tokio::test]
    async fn confirmation_request_carries_the_prepared_artifacts() {
        let api = FakeApi::new();
        let wallet = FakeWallet::new();
        let (runner, _rx) = MintRunner::new(api, wallet, "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");

        runner.run(source()).await.unwrap();

        let confirmed = runner.api.confirmed.lock().unwrap().clone().unwrap();
        assert_eq!(confirmed.token_id, "7");
        assert_eq!(confirmed.file_cid, "QmFileFake");
        assert_eq!(confirmed.metadata_cid, "QmMetaFake");
        assert_eq!(confirmed.original_filename, "design.png");
        assert_eq!(confirmed.mime_type, "image/png");
        assert_eq!(confirmed.size_bytes, 12);

        let submitted = runner.wallet.submitted.lock().unwrap().clone().unwrap();
        assert_eq!(submitted.0, "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266");
        assert_eq!(submitted.1, "ipfs://QmMetaFake");
    }

    #[tokio::test]
    async fn quota_stop_happens_before_any_upload() {
        let api = FakeApi {
            usage: usage_at(5, 0),
            ..FakeApi::new()
        };
        let (runner, mut rx) = MintRunner::new(api, FakeWallet::new(), "0xf39f");

        let err = runner.run(source()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Quota(_)));

        let phases = drain(&mut rx);
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0], MintPhase::CheckingLimits);
        assert!(matches!(&phases[1], MintPhase::Failed { .. }));
        assert!(runner.wallet.submitted.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn prepare_failure_reports_the_server_message() {
        let api = FakeApi {
            fail_prepare: true,
            ..FakeApi::new()
        };
        let (runner, mut rx) = MintRunner::new(api, FakeWallet::new(), "0xf39f");

        let err = runner.run(source()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "registry API error: Failed to upload file to IPFS."
        );

        let phases = drain(&mut rx);
        assert!(matches!(
            phases.last(),
            Some(MintPhase::Failed { message }) if message.contains("Failed to upload file to IPFS.")
        ));
        assert!(runner.wallet.submitted.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn wallet_rejection_fails_the_run() {
        let wallet = FakeWallet {
            reject_signature: true,
            ..FakeWallet::new()
        };
        let (runner, mut rx) = MintRunner::new(FakeApi::new(), wallet, "0xf39f");

        let err = runner.run(source()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Wallet(_)));

        let phases = drain(&mut rx);
        assert!(matches!(phases.last(), Some(MintPhase::Failed { .. })));
        assert!(runner.api.confirmed.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_mint_event_is_fatal() {
        let wallet = FakeWallet {
            missing_event: true,
            ..FakeWallet::new()
        };
        let (runner, mut rx) = MintRunner::new(FakeApi::new(), wallet, "0xf39f");

        let err = runner.run(source()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::MissingMintEvent));

        let phases = drain(&mut rx);
        assert!(matches!(
            phases.last(),
            Some(MintPhase::Failed { message })
                if message == "the confirmed transaction contains no mint event"
        ));
        assert!(runner.api.confirmed.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn dropped_receiver_never_stalls_the_run() {
        let (runner, rx) = MintRunner::new(
            FakeApi::new(),
            FakeWallet::new(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        );
        drop(rx);

        let outcome = runner.run(source()).await.unwrap();
        assert_eq!(outcome.token_id, "7");
    }
}
