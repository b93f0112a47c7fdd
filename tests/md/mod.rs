mod targeting;
