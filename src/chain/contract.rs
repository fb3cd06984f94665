use alloy::primitives::{Address, U256};
use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::SolEvent;

// Interface of the registry NFT contract used by the mint workflow
sol! {
    #[sol(rpc)]
    interface IIpNft {
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

        function safeMint(address to, string memory uri) external returns (uint256);

        function tokenURI(uint256 tokenId) external view returns (string memory);
    }
}

/// Mint facts decoded from a transaction receipt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintEvent {
    pub recipient: Address,
    pub token_id: U256,
}

/// Find the mint in a receipt's logs.
///
/// A mint is the ERC-721 `Transfer` whose `from` is the zero address, emitted
/// by the given contract. Transfers between regular addresses and events from
/// other contracts are skipped.
pub fn mint_event_from_logs(logs: &[Log], contract: Address) -> Option<MintEvent> {
    for log in logs {
        if log.inner.address != contract {
            continue;
        }
        let Some(&topic0) = log.topic0() else {
            continue;
        };
        if topic0 != IIpNft::Transfer::SIGNATURE_HASH {
            continue;
        }

        match log.log_decode::<IIpNft::Transfer>() {
            Ok(decoded) => {
                let IIpNft::Transfer {
                    from,
                    to,
                    tokenId: token_id,
                } = decoded.inner.data;
                if from == Address::ZERO {
                    return Some(MintEvent {
                        recipient: to,
                        token_id,
                    });
                }
            }
            Err(e) => {
                tracing::debug!("Skipping undecodable Transfer log: {}", e);
            }
        }
    }
    None
}
