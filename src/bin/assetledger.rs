#![forbid(unsafe_code)]
use assetledger::blockchain::Block;
use assetledger::crypto::sha256_hex;
use assetledger::error::LedgerError;
use assetledger::node::{Node, SharedLedger};
use assetledger::transaction::{sign_transaction, Transaction};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "assetledger", version, about = "In-memory asset ledger with proof-of-work blocks")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Issue to a participant, transfer between participants and mine both
    Demo,
    /// Print the attestation digest of a file
    Digest { file: PathBuf },
    /// Attest files into a fresh ledger and print the receipts
    Attest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Label to record instead of the file name
        #[arg(long)]
        label: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Digest { file } => {
            let bytes = std::fs::read(&file)?;
            println!("{}  {}", sha256_hex(&bytes), file.display());
        }
        Command::Demo => {
            let node = Node::init(&cli.config)?;
            run_demo(&node.ledger())?;
        }
        Command::Attest { files, label } => {
            let node = Node::init(&cli.config)?;
            run_attest(&node.ledger(), &files, label.as_deref())?;
        }
    }
    Ok(())
}

fn print_block(block: Option<Block>) {
    match block {
        Some(block) => {
            println!("{} {}", "⛏️  Block mined:".green().bold(), block.hash());
            println!("   nonce: {}  transactions: {}", block.nonce(), block.transactions().len());
        }
        None => println!("{}", "Nothing to mine".yellow()),
    }
}

fn run_demo(ledger: &SharedLedger) -> Result<(), Box<dyn std::error::Error>> {
    let issuer = ledger.register("BankIssuer", "issuer")?;
    let alice = ledger.register("Alice", "participant")?;
    let bob = ledger.register("Bob", "participant")?;
    ledger.register("MinerCorp", "payment_provider")?;

    println!("{}", "Registered identities".bold());
    for reg in [&issuer, &alice, &bob] {
        println!("   {:<12} {:<18} {}", reg.username, reg.role.to_string(), reg.address);
    }

    let issue = sign_transaction(
        Transaction::issue(&issuer.address, &alice.address, 100, "Gold Coins"),
        issuer.private_key.expose(),
        &issuer.public_key,
    )?;
    ledger.submit_transaction(issue)?;
    print_block(ledger.mine_pending("MinerCorp")?);

    let transfer = sign_transaction(
        Transaction::transfer(&alice.address, &bob.address, 40),
        alice.private_key.expose(),
        &alice.public_key,
    )?;
    ledger.submit_transaction(transfer)?;
    print_block(ledger.mine_pending("MinerCorp")?);

    println!("\n{}", "Balances".bold());
    for (username, balance) in ledger.balances_view() {
        println!("   {:<12} {}", username, balance);
    }

    let valid = ledger.is_chain_valid();
    let verdict = if valid { "valid".green() } else { "INVALID".red() };
    println!("\nChain is {}", verdict.bold());
    Ok(())
}

fn run_attest(
    ledger: &SharedLedger,
    files: &[PathBuf],
    label: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    for file in files {
        let bytes = std::fs::read(file)?;
        let file_label = match label {
            Some(l) => l.to_string(),
            None => file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file.display().to_string()),
        };

        match ledger.write(|l| l.attest_content(&bytes, &file_label)) {
            Ok(receipt) => {
                println!("{} {}", "✅ Attested".green().bold(), file_label);
                println!("   digest:      {}", receipt.digest);
                println!("   block:       {}", receipt.block_hash);
                println!("   transaction: {}", receipt.transaction_id);
                println!("   timestamp:   {}", receipt.timestamp);
            }
            Err(LedgerError::DuplicateAttestation(digest)) => {
                println!("{} {} ({})", "⚠️  Already attested:".yellow().bold(), file_label, digest);
            }
            Err(e) => return Err(e.into()),
        }
    }

    let count = ledger.read(|l| l.attestations().len());
    println!("\n{} attestation(s) recorded", count);
    Ok(())
}
