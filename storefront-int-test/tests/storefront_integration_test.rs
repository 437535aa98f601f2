mod context;
mod migration;
mod service;
mod source;

#[ctor::ctor]
fn init() {
    colog::init();
}
