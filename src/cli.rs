// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn req(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).required(true).help(help)
}

fn remarks() -> Arg {
    Arg::new("remarks")
        .long("remarks")
        .default_value("")
        .help("Free-text remarks stored with the movement")
}

pub fn build_cli() -> Command {
    Command::new("tierpay")
        .version(clap::crate_version!())
        .about("Tiered wallet ledger: transfers, fund requests, reversals and settlements")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Increase log verbosity (-v info, -vv debug)"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("account")
                .about("Account directory")
                .subcommand(
                    Command::new("open")
                        .about("Open an account with an empty wallet")
                        .arg(req("id", "Account id; prefix AD, MD, DT or RT sets the tier"))
                        .arg(Arg::new("parent").long("parent").help("Parent account id")),
                )
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Show an account, its wallet and recent ledger entries")
                        .arg(req("id", "Account id"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize))
                                .default_value("20"),
                        ),
                )),
        )
        .subcommand(
            Command::new("wallet").about("Wallet funding").subcommand(
                Command::new("load")
                    .about("Credit an admin wallet from an external deposit")
                    .arg(req("admin", "Admin account id"))
                    .arg(req("amount", "Amount"))
                    .arg(remarks()),
            ),
        )
        .subcommand(
            Command::new("transfer")
                .about("Move funds between two wallets")
                .arg(req("from", "Debited account"))
                .arg(req("to", "Credited account"))
                .arg(req("amount", "Amount"))
                .arg(remarks()),
        )
        .subcommand(
            Command::new("request")
                .about("Fund requests")
                .subcommand(
                    Command::new("create")
                        .about("Ask a payer to fund the requester")
                        .arg(req("requester", "Account to be credited"))
                        .arg(req("payer", "Account to be debited"))
                        .arg(req("amount", "Amount"))
                        .arg(remarks()),
                )
                .subcommand(
                    Command::new("accept").about("Accept a pending request").arg(
                        req("id", "Request id").value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(
                    Command::new("reject").about("Reject a pending request").arg(
                        req("id", "Request id").value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("revert")
                .about("Pull funds back from a downline wallet")
                .arg(req("from", "Reversing account (credited)"))
                .arg(req("on", "Reversed account (debited)"))
                .arg(req("amount", "Amount"))
                .arg(remarks()),
        )
        .subcommand(
            Command::new("settle")
                .about("Run a recharge, bill payment or payout through the provider")
                .arg(req("retailer", "Paying retailer"))
                .arg(req(
                    "service",
                    "mobile-recharge | postpaid-recharge | electricity-bill | payout",
                ))
                .arg(req("target", "Mobile number, consumer number or beneficiary"))
                .arg(req("amount", "Amount")),
        )
        .subcommand(
            Command::new("reconcile")
                .about("Re-poll the provider for pending settlements")
                .arg(
                    Arg::new("ref")
                        .long("ref")
                        .help("Reconcile a single settlement by client reference"),
                ),
        )
        .subcommand(json_flags(
            Command::new("history")
                .about("Settlement history of a retailer (reconciles pending first)")
                .arg(req("retailer", "Retailer id"))
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .default_value("50"),
                ),
        ))
        .subcommand(
            Command::new("commission")
                .about("Commission splits")
                .subcommand(
                    Command::new("set")
                        .about("Store an explicit split for an owner and service")
                        .arg(req("owner", "Retailer, distributor or master distributor"))
                        .arg(req("service", "Service name"))
                        .arg(req("total", "Total percent"))
                        .arg(req("admin", "Admin percent"))
                        .arg(req("md", "Master distributor percent"))
                        .arg(req("dist", "Distributor percent"))
                        .arg(req("retailer", "Retailer percent")),
                )
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Resolve the split that applies to a retailer")
                        .arg(req("retailer", "Retailer id"))
                        .arg(req("service", "Service name"))
                        .arg(Arg::new("amount").long("amount").help(
                            "Also convert the split to currency for this amount",
                        )),
                )),
        )
        .subcommand(json_flags(
            Command::new("ledger")
                .about("Ledger entries for a reference")
                .arg(req("reference", "Reference id (e.g. FT12 or a settlement ref)"))
                .arg(req("reason", "Ledger reason, e.g. FUND_TRANSFER")),
        ))
        .subcommand(
            Command::new("config")
                .about("Engine settings")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(json_flags(Command::new("show"))),
        )
        .subcommand(
            Command::new("gate")
                .about("Halt or resume all money movement")
                .subcommand(Command::new("lock"))
                .subcommand(Command::new("unlock"))
                .subcommand(Command::new("status")),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }
}
