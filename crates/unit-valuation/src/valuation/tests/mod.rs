mod common;
mod home;
mod matching;
