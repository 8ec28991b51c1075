use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use crate::execution::models::{CallKind, ContractCall, EncodedPath};

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
    }

    /// Parameters of a multi-hop exact-input swap on the V3 router.
    struct ExactInputParams {
        bytes path;
        address recipient;
        uint256 amountIn;
        uint256 amountOutMinimum;
    }

    interface ISwapRouter02 {
        function exactInput(ExactInputParams calldata params) external payable returns (uint256 amountOut);
    }
}

/// `approve(spender, amount)` on the token contract.
pub fn approve_call(token: Address, spender: Address, amount: U256) -> ContractCall {
    let data = IERC20::approveCall { spender, amount }.abi_encode();
    ContractCall { kind: CallKind::Approval, to: token, data: Bytes::from(data), value: U256::ZERO }
}

/// `exactInput` on the router, sending the output to `recipient` with no minimum output.
pub fn exact_input_call(
    router: Address,
    path: EncodedPath,
    recipient: Address,
    amount_in: U256,
) -> ContractCall {
    let params = ExactInputParams {
        path: path.into_bytes(),
        recipient,
        amountIn: amount_in,
        amountOutMinimum: U256::ZERO,
    };
    let data = ISwapRouter02::exactInputCall { params }.abi_encode();
    ContractCall { kind: CallKind::Swap, to: router, data: Bytes::from(data), value: U256::ZERO }
}

#[cfg(test)]
mod tests {
    use alloy::hex::encode;

    use super::*;

    #[test]
    fn test_approve_call() {
        let token = Address::with_last_byte(0xaa);
        let spender = Address::with_last_byte(0xbb);
        let call = approve_call(token, spender, U256::from(1_000_000u64));

        assert_eq!(call.kind, CallKind::Approval);
        assert_eq!(call.to, token);
        assert_eq!(call.value, U256::ZERO);
        assert_eq!(
            encode(&call.data),
            String::from(concat!(
                // selector
                "095ea7b3",
                // spender
                "00000000000000000000000000000000000000000000000000000000000000bb",
                // amount
                "00000000000000000000000000000000000000000000000000000000000f4240",
            ))
        );
    }

    #[test]
    fn test_exact_input_call() {
        let router = Address::with_last_byte(0x01);
        let recipient = Address::with_last_byte(0x02);
        let path = EncodedPath::new(vec![0x11; 43]);
        let call = exact_input_call(router, path, recipient, U256::from(500u64));

        assert_eq!(call.kind, CallKind::Swap);
        assert_eq!(call.to, router);
        assert_eq!(&call.data[..4], &[0xb8, 0x58, 0x18, 0x3f]);

        let decoded = ISwapRouter02::exactInputCall::abi_decode(&call.data, true).unwrap();
        assert_eq!(decoded.params.path, Bytes::from(vec![0x11; 43]));
        assert_eq!(decoded.params.recipient, recipient);
        assert_eq!(decoded.params.amountIn, U256::from(500u64));
        assert_eq!(decoded.params.amountOutMinimum, U256::ZERO);
    }
}
