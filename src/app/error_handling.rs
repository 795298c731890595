use crate::error::GearError;

/// Report a fatal error on stderr and exit.
///
/// A [`GearError`] prints its user message (plus the developer chain with `-v`)
/// and exits with its category's code. Anything else exits with 1.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    tracing::error!("topup-gear failed: {:#}", error);

    let Some(gear_err) = error.downcast_ref::<GearError>() else {
        eprintln!("Error: {error:#}");
        if verbose >= 1 {
            for (depth, cause) in error.chain().enumerate().skip(1) {
                eprintln!("  caused by [{depth}]: {cause}");
            }
        }
        std::process::exit(1);
    };

    eprintln!("{}", gear_err.user_message());
    if verbose >= 1 {
        eprintln!("\n{}", gear_err.developer_message());
    }
    std::process::exit(gear_err.exit_code())
}
