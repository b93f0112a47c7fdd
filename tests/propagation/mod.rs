mod cser;
