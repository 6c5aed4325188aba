mod mocks;

mod merchants;
mod webhook;
mod withdrawals;
