use easy_sens::consistency::{ConsistencyError, check_second_order_consistency};
use easy_sens::graph::{MX, MXFunction};
use easy_sens::sparsity::Sparsity;

use log::{error, info};
use std::process;

/**
 * Builds `f(x) = diag(x[[1, 0]])` for a dense 2x1 symbol `x`.
 */
fn swapped_diagonal() -> Result<MXFunction, ConsistencyError> {
    let x = MX::sym("x", Sparsity::dense(2, 1));
    let y = x.index(&[1, 0]).diag();
    Ok(MXFunction::new(vec![x], vec![y])?)
}

fn main() {
    env_logger::init();
    let result = swapped_diagonal().and_then(|f| check_second_order_consistency(&f));
    match result {
        Ok(()) => info!("second-order sensitivities agree between both representations"),
        Err(ConsistencyError::Mismatch(mismatch)) => {
            eprintln!("{}", mismatch);
            process::exit(1);
        }
        Err(other) => {
            error!("consistency check could not run: {}", other);
            eprintln!("{}", other);
            process::exit(1);
        }
    }
}
