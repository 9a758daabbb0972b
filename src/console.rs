//! Line-based terminal front end.
//!
//! Input and output are injected so sessions can be scripted.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::Amount;
use crate::atm::{Atm, AtmError, CashReserve};
use crate::model::{NoteBreakdown, TransactionRecord, TransferRequest};

const RULE: &str =
    "+---------------------+---------------+--------------+-----------------------+";

/// Errors that end the terminal loop.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("input closed")]
    Closed,
}

enum Flow {
    Continue,
    Exit,
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

/// Public API
impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run menus until the user exits or input ends, then save and say goodbye.
    ///
    /// The account is saved even when the terminal fails.
    pub fn run<C: CashReserve>(&mut self, atm: &mut Atm<C>) -> Result<(), ConsoleError> {
        let result = self.serve(atm);
        atm.exit();
        result?;

        writeln!(self.output, "\nThank you for using the ATM. Goodbye!")?;
        self.output.flush()?;
        Ok(())
    }
}

/// Menus
impl<R: BufRead, W: Write> Console<R, W> {
    fn serve<C: CashReserve>(&mut self, atm: &mut Atm<C>) -> Result<(), ConsoleError> {
        writeln!(self.output, "============================================")?;
        writeln!(self.output, "        WELCOME TO THE BANK ATM")?;
        writeln!(self.output, "============================================")?;

        loop {
            let step = if atm.session().is_logged_in() {
                self.main_menu(atm)
            } else {
                self.login_menu(atm)
            };
            match step {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => return Ok(()),
                Err(ConsoleError::Closed) => {
                    debug!("input closed, exiting");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn login_menu<C: CashReserve>(&mut self, atm: &mut Atm<C>) -> Result<Flow, ConsoleError> {
        writeln!(self.output, "\nATM LOGIN")?;
        writeln!(self.output, "1. Login with PIN")?;
        writeln!(self.output, "2. Change PIN")?;
        writeln!(self.output, "3. Exit")?;

        match self.prompt_number::<u32>("Choose an option: ")? {
            1 => {
                let pin = self.prompt_number("\nEnter your 4-digit PIN: ")?;
                match atm.login(pin) {
                    Ok(()) => self.success("Login successful! Welcome back.")?,
                    Err(e) => self.failure(&e)?,
                }
            }
            2 => {
                let current = self.prompt_number("\nEnter current PIN: ")?;
                let new = self.prompt_number("Enter new 4-digit PIN: ")?;
                let confirm = self.prompt_number("Confirm new 4-digit PIN: ")?;
                match atm.change_pin(current, new, confirm) {
                    Ok(()) => self.success("PIN changed successfully!")?,
                    Err(e) => self.failure(&e)?,
                }
            }
            3 => return Ok(Flow::Exit),
            _ => writeln!(self.output, "Invalid option! Please try again.")?,
        }
        Ok(Flow::Continue)
    }

    fn main_menu<C: CashReserve>(&mut self, atm: &mut Atm<C>) -> Result<Flow, ConsoleError> {
        writeln!(self.output, "\nMAIN MENU")?;
        writeln!(self.output, "1. Check Balance")?;
        writeln!(self.output, "2. Deposit Money")?;
        writeln!(self.output, "3. Withdraw Money")?;
        writeln!(self.output, "4. Transfer Money")?;
        writeln!(self.output, "5. Transaction History")?;
        writeln!(self.output, "6. Mini Statement")?;
        writeln!(self.output, "7. Logout")?;

        match self.prompt_number::<u32>("Choose an option: ")? {
            1 => self.check_balance(atm)?,
            2 => self.deposit(atm)?,
            3 => self.withdraw(atm)?,
            4 => self.transfer(atm)?,
            5 => self.history(atm)?,
            6 => self.mini_statement(atm)?,
            7 => match atm.logout() {
                Ok(()) => self.success("Logged out successfully!")?,
                Err(e) => self.failure(&e)?,
            },
            _ => writeln!(self.output, "Invalid option! Please try again.")?,
        }
        Ok(Flow::Continue)
    }
}

/// Operations
impl<R: BufRead, W: Write> Console<R, W> {
    fn check_balance<C: CashReserve>(&mut self, atm: &mut Atm<C>) -> Result<(), ConsoleError> {
        writeln!(self.output, "\nACCOUNT BALANCE")?;
        match atm.check_balance() {
            Ok(balance) => writeln!(self.output, "Current Balance: {}", balance.to_rupees())?,
            Err(e) => self.failure(&e)?,
        }
        Ok(())
    }

    fn deposit<C: CashReserve>(&mut self, atm: &mut Atm<C>) -> Result<(), ConsoleError> {
        writeln!(self.output, "\nDEPOSIT MONEY")?;
        let amount = self.prompt_amount("Enter amount to deposit: ₹")?;
        match atm.deposit(amount) {
            Ok(balance) => {
                self.success(&format!("{} deposited successfully!", amount.to_rupees()))?;
                writeln!(self.output, "New Balance: {}", balance.to_rupees())?;
            }
            Err(e) => self.failure(&e)?,
        }
        Ok(())
    }

    fn withdraw<C: CashReserve>(&mut self, atm: &mut Atm<C>) -> Result<(), ConsoleError> {
        writeln!(self.output, "\nWITHDRAW MONEY")?;
        writeln!(self.output, "Available denominations: ₹100, ₹500, ₹2000")?;
        let amount = self.prompt_amount("Enter amount to withdraw: ₹")?;
        match atm.withdraw(amount) {
            Ok(notes) => {
                self.success(&format!("{} withdrawn successfully!", amount.to_rupees()))?;
                self.print_notes(&notes)?;
                writeln!(self.output, "New Balance: {}", atm.balance().to_rupees())?;
            }
            Err(e) => self.failure(&e)?,
        }
        Ok(())
    }

    fn transfer<C: CashReserve>(&mut self, atm: &mut Atm<C>) -> Result<(), ConsoleError> {
        writeln!(self.output, "\nTRANSFER MONEY")?;
        let account_number = self.prompt("Enter recipient account number: ")?;
        let recipient = self.prompt("Enter recipient name: ")?;
        let ifsc = self.prompt("Enter IFSC code: ")?;
        let amount = self.prompt_amount("Enter amount to transfer: ₹")?;
        let request = TransferRequest {
            account_number,
            recipient,
            ifsc,
            amount,
        };

        // the confirmation callback cannot return io errors, so keep the first one
        let mut io_failure = None;
        let result = atm.transfer(&request, |req| match self.confirm_transfer(req) {
            Ok(answer) => answer,
            Err(e) => {
                io_failure = Some(e);
                false
            }
        });
        if let Some(e) = io_failure {
            return Err(e);
        }

        match result {
            Ok(balance) => {
                self.success(&format!(
                    "{} transferred to {} successfully!",
                    amount.to_rupees(),
                    request.recipient
                ))?;
                writeln!(self.output, "New Balance: {}", balance.to_rupees())?;
            }
            Err(e) => self.failure(&e)?,
        }
        Ok(())
    }

    fn history<C: CashReserve>(&mut self, atm: &mut Atm<C>) -> Result<(), ConsoleError> {
        writeln!(self.output, "\nTRANSACTION HISTORY")?;
        match atm.history() {
            Ok(records) => self.print_records(&records)?,
            Err(e) => self.failure(&e)?,
        }
        Ok(())
    }

    fn mini_statement<C: CashReserve>(&mut self, atm: &mut Atm<C>) -> Result<(), ConsoleError> {
        writeln!(self.output, "\nMINI STATEMENT")?;
        match atm.mini_statement() {
            Ok((balance, records)) => {
                writeln!(self.output, "Current Balance: {}", balance.to_rupees())?;
                self.print_records(&records)?;
            }
            Err(e) => self.failure(&e)?,
        }
        Ok(())
    }
}

/// Rendering and input helpers
impl<R: BufRead, W: Write> Console<R, W> {
    fn confirm_transfer(&mut self, request: &TransferRequest) -> Result<bool, ConsoleError> {
        writeln!(self.output, "\nTRANSFER DETAILS:")?;
        writeln!(self.output, "Recipient: {}", request.recipient)?;
        writeln!(self.output, "Account: {}", request.account_number)?;
        writeln!(self.output, "IFSC: {}", request.ifsc)?;
        writeln!(self.output, "Amount: {}", request.amount.to_rupees())?;
        let answer = self.prompt("Confirm transfer? (yes/no): ")?;
        Ok(answer.eq_ignore_ascii_case("yes"))
    }

    fn print_notes(&mut self, notes: &NoteBreakdown) -> Result<(), ConsoleError> {
        writeln!(self.output, "Notes dispensed:")?;
        for (face, count) in notes.notes() {
            if count > 0 {
                let subtotal = Amount::from_units(face * i64::from(count));
                writeln!(
                    self.output,
                    "   {:<6} x {count} = {}",
                    format!("₹{face}"),
                    subtotal.to_rupees()
                )?;
            }
        }
        Ok(())
    }

    fn print_records(&mut self, records: &[TransactionRecord]) -> Result<(), ConsoleError> {
        if records.is_empty() {
            writeln!(self.output, "No transactions found.")?;
            return Ok(());
        }

        writeln!(self.output, "{RULE}")?;
        writeln!(
            self.output,
            "| {:<19} | {:<13} | {:<12} | {:<21} |",
            "Date & Time", "Type", "Amount", "Description"
        )?;
        writeln!(self.output, "{RULE}")?;
        for record in records {
            let amount = if record.amount.is_zero() {
                "-".to_string()
            } else {
                record.amount.to_rupees()
            };
            writeln!(
                self.output,
                "| {:<19} | {:<13} | {:<12} | {:<21} |",
                record.timestamp.format(crate::ledger::TIMESTAMP_FORMAT).to_string(),
                record.kind.as_str(),
                amount,
                record.description
            )?;
        }
        writeln!(self.output, "{RULE}")?;
        Ok(())
    }

    fn success(&mut self, message: &str) -> Result<(), ConsoleError> {
        writeln!(self.output, "✅ {message}")?;
        Ok(())
    }

    fn failure(&mut self, error: &AtmError) -> Result<(), ConsoleError> {
        writeln!(self.output, "❌ {error}")?;
        Ok(())
    }

    /// Print `message` and read one line without its line terminator.
    fn prompt(&mut self, message: &str) -> Result<String, ConsoleError> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(ConsoleError::Closed);
        }
        let content = line.strip_suffix('\n').unwrap_or(&line);
        Ok(content.strip_suffix('\r').unwrap_or(content).to_string())
    }

    /// Prompt until the line parses as a number.
    fn prompt_number<T: FromStr>(&mut self, message: &str) -> Result<T, ConsoleError> {
        self.prompt_until(message, "Invalid input! Please enter a number: ")
    }

    /// Prompt until the line parses as an amount.
    fn prompt_amount(&mut self, message: &str) -> Result<Amount, ConsoleError> {
        self.prompt_until(message, "Invalid input! Please enter a valid amount: ")
    }

    fn prompt_until<T: FromStr>(&mut self, message: &str, retry: &str) -> Result<T, ConsoleError> {
        let mut line = self.prompt(message)?;
        loop {
            match line.trim().parse() {
                Ok(value) => return Ok(value),
                Err(_) => line = self.prompt(retry)?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atm::TrackedCashReserve;
    use crate::ledger::Ledger;
    use crate::model::TransactionKind;
    use crate::store::SnapshotStore;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> Atm<TrackedCashReserve> {
        Atm::open(
            SnapshotStore::new(dir.path().join("atm_data.txt")),
            Ledger::new(dir.path().join("transactions.txt")),
            TrackedCashReserve::new(Amount::from_units(100_000)),
        )
    }

    /// Run a scripted session and return what was printed.
    fn session(atm: &mut Atm<TrackedCashReserve>, script: &str) -> String {
        let mut console = Console::new(Cursor::new(script.as_bytes().to_vec()), Vec::new());
        console.run(atm).unwrap();
        String::from_utf8(console.into_output()).unwrap()
    }

    fn ledger_kinds(dir: &TempDir) -> Vec<TransactionKind> {
        Ledger::new(dir.path().join("transactions.txt"))
            .read_all()
            .unwrap()
            .into_iter()
            .map(|r| r.kind)
            .collect()
    }

    #[test]
    fn exit_from_login_menu() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(&mut atm, "3\n");
        assert!(out.contains("ATM LOGIN"));
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn end_of_input_exits() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(&mut atm, "1\n");
        assert!(out.contains("Enter your 4-digit PIN"));
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn non_numeric_input_reprompts() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(&mut atm, "abc\n\n1\nxyz\n1234\n7\n3\n");
        assert_eq!(out.matches("Please enter a number").count(), 3);
        assert!(out.contains("Login successful"));
        assert!(out.contains("Logged out successfully"));
    }

    #[test]
    fn invalid_menu_choice_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(&mut atm, "9\n3\n");
        assert!(out.contains("Invalid option"));
        assert!(ledger_kinds(&dir).is_empty());
    }

    #[test]
    fn wrong_pin_stays_logged_out() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(&mut atm, "1\n1111\n3\n");
        assert!(out.contains("invalid PIN"));
        assert!(!atm.session().is_logged_in());
    }

    #[test]
    fn deposit_and_balance() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(&mut atm, "1\n1234\n2\nten\n500\n1\n7\n3\n");

        assert!(out.contains("Please enter a valid amount"));
        assert!(out.contains("₹500.00 deposited successfully!"));
        assert!(out.contains("Current Balance: ₹10,500.00"));
        assert_eq!(
            ledger_kinds(&dir),
            vec![
                TransactionKind::Login,
                TransactionKind::Deposit,
                TransactionKind::BalanceCheck,
                TransactionKind::Logout,
            ]
        );
    }

    #[test]
    fn withdrawal_prints_notes() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(&mut atm, "1\n1234\n3\n4700\n7\n3\n");

        assert!(out.contains("₹4,700.00 withdrawn successfully!"));
        assert!(out.contains("₹2000  x 2 = ₹4,000.00"));
        assert!(out.contains("₹500   x 1 = ₹500.00"));
        assert!(out.contains("₹100   x 2 = ₹200.00"));
        assert!(out.contains("New Balance: ₹5,300.00"));
    }

    #[test]
    fn declined_transfer_is_cancelled() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(
            &mut atm,
            "1\n1234\n4\n12345678901\nRavi\nABCD0123456\n200\nno\n7\n3\n",
        );

        assert!(out.contains("TRANSFER DETAILS"));
        assert!(out.contains("transfer cancelled"));
        assert_eq!(atm.balance(), Amount::from_units(10_000));
        assert_eq!(
            ledger_kinds(&dir),
            vec![TransactionKind::Login, TransactionKind::Logout]
        );
    }

    #[test]
    fn confirmed_transfer() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(
            &mut atm,
            "1\n1234\n4\n12345678901\nRavi\nABCD0123456\n200\nYES\n7\n3\n",
        );

        assert!(out.contains("₹200.00 transferred to Ravi successfully!"));
        assert_eq!(atm.balance(), Amount::from_units(9_800));
    }

    #[test]
    fn invalid_transfer_skips_confirmation() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(&mut atm, "1\n1234\n4\n123\nRavi\nABCD0123456\n200\n7\n3\n");

        assert!(out.contains("invalid account number"));
        assert!(!out.contains("TRANSFER DETAILS"));
    }

    #[test]
    fn transfer_fields_are_not_trimmed() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(
            &mut atm,
            "1\n1234\n4\n 12345678901 \nRavi\nABCD0123456\n200\n7\n3\n",
        );

        assert!(out.contains("invalid account number ' 12345678901 '"));
        assert!(!out.contains("TRANSFER DETAILS"));
        assert_eq!(atm.balance(), Amount::from_units(10_000));
    }

    #[test]
    fn crlf_input_is_accepted() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(
            &mut atm,
            "1\r\n1234\r\n4\r\n12345678901\r\nRavi\r\nABCD0123456\r\n200\r\nyes\r\n7\r\n3\r\n",
        );

        assert!(out.contains("₹200.00 transferred to Ravi successfully!"));
    }

    /// Output that fails on the first write.
    struct BrokenTerminal;

    impl Write for BrokenTerminal {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal gone"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn terminal_failure_still_saves_snapshot() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let snapshot = dir.path().join("atm_data.txt");
        std::fs::remove_file(&snapshot).unwrap();

        let mut console = Console::new(Cursor::new(b"3\n".to_vec()), BrokenTerminal);
        assert!(matches!(console.run(&mut atm), Err(ConsoleError::Io(_))));
        assert!(snapshot.exists());
    }

    #[test]
    fn change_pin_before_login() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(&mut atm, "2\n1234\n4321\n4321\n1\n4321\n7\n3\n");

        assert!(out.contains("PIN changed successfully!"));
        assert!(out.contains("Login successful"));
    }

    #[test]
    fn history_and_mini_statement_tables() {
        let dir = TempDir::new().unwrap();
        let mut atm = open(&dir);
        let out = session(&mut atm, "1\n1234\n2\n500\n5\n6\n7\n3\n");

        assert!(out.contains("TRANSACTION HISTORY"));
        assert!(out.contains("| DEPOSIT       | ₹500.00      | Cash deposit          |"));
        assert!(out.contains("| LOGIN         | -            | User logged in        |"));
        assert!(out.contains("MINI STATEMENT"));
        assert_eq!(
            ledger_kinds(&dir),
            vec![
                TransactionKind::Login,
                TransactionKind::Deposit,
                TransactionKind::HistoryView,
                TransactionKind::MiniStatement,
                TransactionKind::Logout,
            ]
        );
    }
}
